use crate::CLAP_STYLING;
use clap::{arg, command};
use url::Url;

pub(crate) fn command_argument_builder() -> clap::Command {
    clap::Command::new("pagecheck")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("pagecheck")
        .styles(CLAP_STYLING)
        .arg(arg!(-q --"quiet" "Suppress banner and non-essential output").required(false))
        .subcommand_required(false)
        .subcommand(
            command!("analyze")
                .about(
                    "Scores every HTML document under a directory against the SEO rubric \
                and reports findings and duplicates.",
                )
                .arg(
                    arg!([DIR])
                        .required(false)
                        .help("Corpus root directory")
                        .default_value("."),
                )
                .arg(
                    arg!(-b --"base-url" <URL>)
                        .required(false)
                        .help("Site base URL, used to derive canonical and og:image URLs")
                        .value_parser(clap::value_parser!(Url)),
                )
                .arg(
                    arg!(-o --"report" <PATH>)
                        .required(false)
                        .help("Save the JSON run report to file (default: display summary only)")
                        .value_parser(clap::value_parser!(std::path::PathBuf)),
                ),
        )
        .subcommand(
            command!("fix")
                .about(
                    "Applies idempotent fixes for remediable findings, backing each file \
                up once per campaign before touching it.",
                )
                .arg(
                    arg!([DIR])
                        .required(false)
                        .help("Corpus root directory")
                        .default_value("."),
                )
                .arg(
                    arg!(-c --"campaign" <ID>)
                        .required(false)
                        .help("Campaign id scoping backup files (default: a random id)"),
                )
                .arg(
                    arg!(-b --"base-url" <URL>)
                        .required(false)
                        .help("Site base URL, used to derive canonical and og:image URLs")
                        .value_parser(clap::value_parser!(Url)),
                )
                .arg(
                    arg!(-o --"report" <PATH>)
                        .required(false)
                        .help("Save the JSON run report to file (default: display summary only)")
                        .value_parser(clap::value_parser!(std::path::PathBuf)),
                ),
        )
        .subcommand(command!("rules").about("Prints the rubric rule table with codes and weights"))
}
