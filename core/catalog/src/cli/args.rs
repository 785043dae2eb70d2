use crate::domain::{CatalogCommand, CategoryId, EditOp, PartId};
use clap::builder::ArgAction;
use clap::error::ErrorKind;
use clap::value_parser;
use clap_complete::Shell;
use common::error::Error;
use std::ffi::OsString;
use std::io::Write;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// --base-url: カタログサービスのベース URL（設定ファイル・環境変数より優先）
    pub base_url: Option<String>,
    /// --timeout: 1 要求あたりのタイムアウト（秒）
    pub timeout_secs: Option<u64>,
    /// -v / --verbose: 調査用のログを stderr に出す
    pub verbose: bool,
    pub command: CatalogCommand,
}

/// 解析結果: 通常の Config / 補完スクリプト生成 / ヘルプ表示
#[derive(Debug, Clone)]
pub enum ParseOutcome {
    Run(Config),
    GenerateCompletion(Shell),
    /// --help / --version（clap が整形した文言）
    Help(String),
}

fn part_arg(help: &'static str) -> clap::Arg {
    clap::Arg::new("part")
        .value_name("PART")
        .help(help)
        .required(true)
}

pub fn build_clap_command() -> clap::Command {
    clap::Command::new("catalog")
        .about("Browse and edit the GitPLM parts catalog")
        .version(env!("CARGO_PKG_VERSION"))
        .subcommand_required(true)
        .arg(
            clap::Arg::new("base-url")
                .long("base-url")
                .value_name("URL")
                .help("Catalog service base URL (default: $GITPLM_API_BASE or http://localhost:8080)")
                .global(true)
                .num_args(1),
        )
        .arg(
            clap::Arg::new("timeout")
                .long("timeout")
                .value_name("SECS")
                .help("Per-request timeout in seconds")
                .value_parser(value_parser!(u64))
                .global(true)
                .num_args(1),
        )
        .arg(
            clap::Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Emit debug logs to stderr")
                .global(true)
                .action(ArgAction::SetTrue),
        )
        .subcommand(
            clap::Command::new("categories")
                .about("List categories")
                .arg(
                    clap::Arg::new("filter")
                        .short('f')
                        .long("filter")
                        .value_name("TERM")
                        .help("Case-insensitive substring filter on id and name")
                        .num_args(1),
                ),
        )
        .subcommand(
            clap::Command::new("parts")
                .about("List parts in a category")
                .arg(
                    clap::Arg::new("category")
                        .value_name("CATEGORY")
                        .help("Category id (e.g. RES)")
                        .required(true),
                ),
        )
        .subcommand(
            clap::Command::new("show")
                .about("Show a part with its description and sources")
                .arg(part_arg("Part id (e.g. RES-001-0001)")),
        )
        .subcommand(
            clap::Command::new("edit")
                .about("Edit the description and sources of a part and save it")
                .arg(part_arg("Part id to edit"))
                .arg(
                    clap::Arg::new("description")
                        .short('d')
                        .long("description")
                        .value_name("TEXT")
                        .help("New description")
                        .num_args(1),
                )
                .arg(
                    clap::Arg::new("manufacturer")
                        .long("manufacturer")
                        .value_name("N=VALUE")
                        .help("Set the manufacturer of source N (1-based)")
                        .action(ArgAction::Append),
                )
                .arg(
                    clap::Arg::new("mpn")
                        .long("mpn")
                        .value_name("N=VALUE")
                        .help("Set the manufacturer part number of source N (1-based)")
                        .action(ArgAction::Append),
                )
                .arg(
                    clap::Arg::new("add-source")
                        .long("add-source")
                        .value_name("MFR:MPN")
                        .help("Append a source")
                        .action(ArgAction::Append),
                )
                .arg(
                    clap::Arg::new("remove-source")
                        .long("remove-source")
                        .value_name("N")
                        .help("Remove source N (positions refer to the part as loaded)")
                        .value_parser(value_parser!(usize))
                        .action(ArgAction::Append),
                )
                .arg(
                    clap::Arg::new("dry-run")
                        .short('n')
                        .long("dry-run")
                        .help("Show the changes without saving")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            clap::Command::new("revise")
                .about("Create a new revision of a part")
                .arg(part_arg("Part id to revise")),
        )
        .subcommand(
            clap::Command::new("create")
                .about("Create a part in a category")
                .arg(
                    clap::Arg::new("category")
                        .value_name("CATEGORY")
                        .help("Category id")
                        .required(true),
                )
                .arg(
                    clap::Arg::new("id")
                        .value_name("ID")
                        .help("New part id")
                        .required(true),
                )
                .arg(
                    clap::Arg::new("name")
                        .long("name")
                        .value_name("NAME")
                        .help("Display name")
                        .num_args(1),
                ),
        )
        .subcommand(clap::Command::new("ping").about("Check that the catalog service is reachable"))
        .subcommand(
            clap::Command::new("completion")
                .about("Generate a shell completion script")
                .arg(
                    clap::Arg::new("shell")
                        .value_name("SHELL")
                        .required(true)
                        .value_parser(value_parser!(Shell)),
                ),
        )
}

/// "N=VALUE" を (N, VALUE) に分ける。N は 1 以上。
fn parse_indexed(flag: &str, raw: &str) -> Result<(usize, String), Error> {
    let (n, value) = raw.split_once('=').ok_or_else(|| {
        Error::invalid_argument(format!("--{} expects N=VALUE, got '{}'", flag, raw))
    })?;
    let position: usize = n.trim().parse().map_err(|_| {
        Error::invalid_argument(format!("--{}: '{}' is not a source number", flag, n))
    })?;
    if position == 0 {
        return Err(Error::invalid_argument(format!(
            "--{}: source numbers start at 1",
            flag
        )));
    }
    Ok((position, value.to_string()))
}

/// "MFR:MPN" を (MFR, MPN) に分ける（最初の ':' で区切る）
fn parse_source(raw: &str) -> Result<(String, String), Error> {
    let (manufacturer, mpn) = raw.split_once(':').ok_or_else(|| {
        Error::invalid_argument(format!("--add-source expects MFR:MPN, got '{}'", raw))
    })?;
    Ok((manufacturer.trim().to_string(), mpn.trim().to_string()))
}

fn values<'a>(matches: &'a clap::ArgMatches, id: &str) -> impl Iterator<Item = &'a String> {
    matches.get_many::<String>(id).into_iter().flatten()
}

/// 編集オプションを EditOp 列にする。
///
/// 適用順は 説明文 → メーカー/型番の上書き → 追加 → 削除。削除は番号の大きい方から行うので、
/// どの番号も読み込んだ時点の並びを指す。
fn edit_ops(matches: &clap::ArgMatches) -> Result<Vec<EditOp>, Error> {
    let mut ops = Vec::new();
    if let Some(d) = matches.get_one::<String>("description") {
        ops.push(EditOp::Description(d.clone()));
    }
    for raw in values(matches, "manufacturer") {
        let (position, value) = parse_indexed("manufacturer", raw)?;
        ops.push(EditOp::Manufacturer { position, value });
    }
    for raw in values(matches, "mpn") {
        let (position, value) = parse_indexed("mpn", raw)?;
        ops.push(EditOp::Mpn { position, value });
    }
    for raw in values(matches, "add-source") {
        let (manufacturer, mpn) = parse_source(raw)?;
        ops.push(EditOp::AddSource { manufacturer, mpn });
    }
    let mut removals: Vec<usize> = matches
        .get_many::<usize>("remove-source")
        .map(|i| i.copied().collect())
        .unwrap_or_default();
    removals.sort_unstable_by(|a, b| b.cmp(a));
    removals.dedup();
    ops.extend(removals.into_iter().map(|position| EditOp::RemoveSource { position }));
    Ok(ops)
}

fn required<'a>(matches: &'a clap::ArgMatches, id: &str) -> Result<&'a String, Error> {
    matches
        .get_one::<String>(id)
        .ok_or_else(|| Error::invalid_argument(format!("missing <{}>", id)))
}

fn subcommand_to_command(name: &str, sub: &clap::ArgMatches) -> Result<CatalogCommand, Error> {
    let command = match name {
        "categories" => CatalogCommand::Categories {
            filter: sub.get_one::<String>("filter").cloned(),
        },
        "parts" => CatalogCommand::Parts {
            category: CategoryId::new(required(sub, "category")?.as_str()),
        },
        "show" => CatalogCommand::Show {
            part: PartId::new(required(sub, "part")?.as_str()),
        },
        "edit" => {
            let edits = edit_ops(sub)?;
            if edits.is_empty() {
                return Err(Error::invalid_argument(
                    "edit needs at least one of --description, --manufacturer, --mpn, --add-source, --remove-source",
                ));
            }
            CatalogCommand::Edit {
                part: PartId::new(required(sub, "part")?.as_str()),
                edits,
                dry_run: sub.get_flag("dry-run"),
            }
        }
        "revise" => CatalogCommand::Revise {
            part: PartId::new(required(sub, "part")?.as_str()),
        },
        "create" => CatalogCommand::Create {
            category: CategoryId::new(required(sub, "category")?.as_str()),
            id: PartId::new(required(sub, "id")?.as_str()),
            name: sub.get_one::<String>("name").cloned().unwrap_or_default(),
        },
        "ping" => CatalogCommand::Ping,
        other => {
            return Err(Error::invalid_argument(format!(
                "unknown command '{}'",
                other
            )))
        }
    };
    Ok(command)
}

fn matches_to_outcome(matches: &clap::ArgMatches) -> Result<ParseOutcome, Error> {
    let (name, sub) = matches
        .subcommand()
        .ok_or_else(|| Error::invalid_argument("no command given"))?;
    if name == "completion" {
        if let Some(&shell) = sub.get_one::<Shell>("shell") {
            return Ok(ParseOutcome::GenerateCompletion(shell));
        }
    }
    Ok(ParseOutcome::Run(Config {
        base_url: matches.get_one::<String>("base-url").cloned(),
        timeout_secs: matches.get_one::<u64>("timeout").copied(),
        verbose: matches.get_flag("verbose"),
        command: subcommand_to_command(name, sub)?,
    }))
}

/// 引数列を解析する（先頭はプログラム名）
pub fn parse_args_from<I, T>(args: I) -> Result<ParseOutcome, Error>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    match build_clap_command().try_get_matches_from(args) {
        Ok(matches) => matches_to_outcome(&matches),
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            Ok(ParseOutcome::Help(e.to_string()))
        }
        Err(e) => Err(Error::invalid_argument(e.to_string())),
    }
}

/// コマンドラインを解析する
pub fn parse_args() -> Result<ParseOutcome, Error> {
    parse_args_from(std::env::args_os())
}

/// 補完スクリプトを out に書き出す
pub fn print_completion(shell: Shell, out: &mut dyn Write) {
    let mut cmd = build_clap_command();
    clap_complete::generate(shell, &mut cmd, "catalog", out);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(args: &[&str]) -> Config {
        match parse_args_from(std::iter::once("catalog").chain(args.iter().copied())).unwrap() {
            ParseOutcome::Run(config) => config,
            other => panic!("expected a command, got {:?}", other),
        }
    }

    fn parse_err(args: &[&str]) -> Error {
        parse_args_from(std::iter::once("catalog").chain(args.iter().copied())).unwrap_err()
    }

    #[test]
    fn test_clap_command_is_consistent() {
        build_clap_command().debug_assert();
    }

    #[test]
    fn test_categories_with_filter() {
        let config = run(&["categories", "--filter", "res"]);
        assert_eq!(
            config.command,
            CatalogCommand::Categories {
                filter: Some("res".to_string())
            }
        );
        assert!(!config.verbose);
        assert!(config.base_url.is_none());
    }

    #[test]
    fn test_global_options_after_subcommand() {
        let config = run(&["parts", "RES", "--base-url", "http://plm:9000", "--timeout", "3", "-v"]);
        assert_eq!(
            config.command,
            CatalogCommand::Parts {
                category: CategoryId::new("RES")
            }
        );
        assert_eq!(config.base_url.as_deref(), Some("http://plm:9000"));
        assert_eq!(config.timeout_secs, Some(3));
        assert!(config.verbose);
    }

    #[test]
    fn test_edit_collects_ops_in_apply_order() {
        let config = run(&[
            "edit",
            "IC-001-0001",
            "--remove-source",
            "1",
            "--mpn",
            "2=NE5532",
            "--add-source",
            "ST:TL072",
            "--remove-source",
            "3",
            "--description",
            "op-amp",
            "--dry-run",
        ]);
        assert_eq!(
            config.command,
            CatalogCommand::Edit {
                part: PartId::new("IC-001-0001"),
                edits: vec![
                    EditOp::Description("op-amp".to_string()),
                    EditOp::Mpn {
                        position: 2,
                        value: "NE5532".to_string()
                    },
                    EditOp::AddSource {
                        manufacturer: "ST".to_string(),
                        mpn: "TL072".to_string()
                    },
                    EditOp::RemoveSource { position: 3 },
                    EditOp::RemoveSource { position: 1 },
                ],
                dry_run: true,
            }
        );
    }

    #[test]
    fn test_edit_value_may_contain_equals() {
        let config = run(&["edit", "R-1", "--manufacturer", "1=A=B"]);
        match config.command {
            CatalogCommand::Edit { edits, .. } => assert_eq!(
                edits,
                vec![EditOp::Manufacturer {
                    position: 1,
                    value: "A=B".to_string()
                }]
            ),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_edit_rejects_bad_values() {
        assert_eq!(parse_err(&["edit", "R-1"]).exit_code(), 64);
        assert_eq!(parse_err(&["edit", "R-1", "--mpn", "X"]).exit_code(), 64);
        assert_eq!(parse_err(&["edit", "R-1", "--mpn", "0=X"]).exit_code(), 64);
        assert_eq!(parse_err(&["edit", "R-1", "--add-source", "TI"]).exit_code(), 64);
    }

    #[test]
    fn test_create_name_defaults_to_empty() {
        let config = run(&["create", "RES", "RES-002-0001"]);
        assert_eq!(
            config.command,
            CatalogCommand::Create {
                category: CategoryId::new("RES"),
                id: PartId::new("RES-002-0001"),
                name: String::new(),
            }
        );
    }

    #[test]
    fn test_missing_subcommand_is_usage_error() {
        assert_eq!(parse_err(&[]).exit_code(), 64);
        assert_eq!(parse_err(&["--unknown"]).exit_code(), 64);
        assert_eq!(parse_err(&["show"]).exit_code(), 64);
    }

    #[test]
    fn test_help_is_not_an_error() {
        let outcome = parse_args_from(["catalog", "--help"]).unwrap();
        match outcome {
            ParseOutcome::Help(text) => assert!(text.contains("categories")),
            other => panic!("expected help, got {:?}", other),
        }
    }

    #[test]
    fn test_completion() {
        let outcome = parse_args_from(["catalog", "completion", "bash"]).unwrap();
        assert!(matches!(outcome, ParseOutcome::GenerateCompletion(Shell::Bash)));

        let mut out = Vec::new();
        print_completion(Shell::Bash, &mut out);
        let script = String::from_utf8(out).unwrap();
        assert!(script.contains("catalog"));
    }
}
