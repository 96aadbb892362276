use crate::CLAP_STYLING;
use clap::{arg, command};

pub(crate) fn command_argument_builder() -> clap::Command {
    clap::Command::new("sitegraph")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("sitegraph")
        .styles(CLAP_STYLING)
        .arg(arg!(-q --"quiet" "Suppress banner and non-essential output").required(false))
        .arg(arg!(-v --"verbose" "Log crawl activity to stderr").required(false))
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            command!("crawl")
                .about(
                    "Crawl a site from a root URL and map the links and assets between its \
                pages.",
                )
                .arg(
                    arg!(<URL>)
                        .required(true)
                        .help("The root URL to crawl; http:// is assumed when no scheme is given"),
                )
                .arg(
                    arg!(--"max-depth" <DEPTH>)
                        .required(false)
                        .help("Do not expand pages further than this many links from the root")
                        .value_parser(clap::value_parser!(u64))
                        .default_value("30"),
                )
                .arg(
                    arg!(--"max-requests" <COUNT>)
                        .required(false)
                        .help("Maximum number of fetches for the whole crawl")
                        .value_parser(clap::value_parser!(u64))
                        .default_value("200"),
                )
                .arg(
                    arg!(--"no-assets")
                        .required(false)
                        .help("Leave assets (stylesheets, scripts, images) out of the graph")
                        .action(clap::ArgAction::SetTrue),
                )
                .arg(
                    arg!(-t --"threads" <NUM_WORKERS>)
                        .required(false)
                        .help("The number of async fetch workers (default: available parallelism)")
                        .value_parser(clap::value_parser!(usize)),
                )
                .arg(
                    arg!(--"timeout" <SECONDS>)
                        .required(false)
                        .help("Request timeout in seconds")
                        .value_parser(clap::value_parser!(u64).range(1..))
                        .default_value("10"),
                )
                .arg(
                    arg!(-f --"format" <FORMAT>)
                        .required(false)
                        .help("Report format: text, json, dot, html")
                        .value_parser(["text", "json", "dot", "html"])
                        .default_value("text"),
                )
                .arg(
                    arg!(-o --"output" <PATH>)
                        .required(false)
                        .help(
                            "Save report to file, or to sitegraph.<format> inside a directory \
                        (default: write to stdout)",
                        ),
                ),
        )
}
