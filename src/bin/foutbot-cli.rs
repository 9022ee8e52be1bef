//! foutbot CLI - offline knowledge-base inspection
//!
//! Runs the loader, resolver, and keyword fallback against the configured
//! workbook without touching Telegram:
//!   foutbot-cli kb stats
//!   foutbot-cli kb lookup <module> <code>
//!   foutbot-cli ask <question..>

use std::env;
use std::path::PathBuf;
use std::process::ExitCode;

use foutbot_lib::bot::answer_text;
use foutbot_lib::config::Config;
use foutbot_lib::kb::{xlsx, KnowledgeBase};

#[derive(Debug)]
enum Command {
    Kb(KbCommand),
    Ask { question: String },
    Help,
    Version,
}

#[derive(Debug)]
enum KbCommand {
    Stats,
    Lookup { module: String, code: String },
}

fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();

    match parse_args(&args) {
        Ok(cmd) => match run_command(cmd) {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("Error: {}", e);
                ExitCode::FAILURE
            }
        },
        Err(e) => {
            eprintln!("Error: {}", e);
            print_help();
            ExitCode::FAILURE
        }
    }
}

fn parse_args(args: &[String]) -> Result<Command, String> {
    if args.len() < 2 {
        return Ok(Command::Help);
    }

    match args[1].as_str() {
        "help" | "--help" | "-h" => Ok(Command::Help),
        "version" | "--version" | "-V" => Ok(Command::Version),

        "kb" => {
            if args.len() < 3 {
                return Err("Missing kb subcommand. Use: stats, lookup".to_string());
            }
            match args[2].as_str() {
                "stats" => Ok(Command::Kb(KbCommand::Stats)),
                "lookup" => {
                    let module = args.get(3).ok_or("Missing module name")?.clone();
                    let code = args.get(4).ok_or("Missing error code")?.clone();
                    Ok(Command::Kb(KbCommand::Lookup { module, code }))
                }
                _ => Err(format!("Unknown kb subcommand: {}", args[2])),
            }
        }

        "ask" => {
            if args.len() < 3 {
                return Err("Missing question".to_string());
            }
            Ok(Command::Ask {
                question: args[2..].join(" "),
            })
        }

        _ => Err(format!("Unknown command: {}", args[1])),
    }
}

fn run_command(cmd: Command) -> Result<(), String> {
    match cmd {
        Command::Help => {
            print_help();
            Ok(())
        }
        Command::Version => {
            println!("foutbot-cli {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Command::Kb(kb_cmd) => run_kb_command(kb_cmd),
        Command::Ask { question } => run_ask(&question),
    }
}

fn print_help() {
    println!(
        r#"foutbot CLI - offline knowledge-base inspection

USAGE:
    foutbot-cli <COMMAND> [OPTIONS]

COMMANDS:
    kb stats                    Show knowledge-base statistics

    kb lookup <MODULE> <CODE>   Resolve one error code

    ask <QUESTION..>            Run a question through the full pipeline
                                and print the replies the bot would send

    help                        Show this help message
    version                     Show version information

EXAMPLES:
    foutbot-cli kb stats
    foutbot-cli kb lookup MotorA 12
    foutbot-cli ask motorA 12 34
    foutbot-cli ask hoe reset ik de machine
"#
    );
}

fn workbook_path() -> Result<PathBuf, String> {
    let config = Config::load().map_err(|e| format!("Failed to load configuration: {}", e))?;
    Ok(config.workbook_path)
}

fn load_kb() -> Result<KnowledgeBase, String> {
    let path = workbook_path()?;
    if !path.exists() {
        return Err(format!("Workbook not found at {:?}", path));
    }
    xlsx::load(&path).map_err(|e| format!("Failed to load workbook: {}", e))
}

fn run_kb_command(cmd: KbCommand) -> Result<(), String> {
    let kb = load_kb()?;

    match cmd {
        KbCommand::Stats => {
            println!("Knowledge Base Statistics");
            println!("{}", "-".repeat(30));
            println!("Modules:          {}", kb.module_count());
            println!("Code rows:        {}", kb.code_count());
            println!("General Q&A rows: {}", kb.general().len());
            println!("Authorized users: {}", kb.authorized_user_count());
            Ok(())
        }
        KbCommand::Lookup { module, code } => {
            let row = kb
                .resolve(&module, &code)
                .map_err(|e| format!("{}", e))?;

            println!("Module: {}", module);
            println!("Foutcode: {}", row.code);
            println!("Beschrijving: {}", row.description);
            for (i, remedy) in row.filled_remedies().enumerate() {
                println!("  {}. {}", i + 1, remedy);
            }
            Ok(())
        }
    }
}

fn run_ask(question: &str) -> Result<(), String> {
    let kb = load_kb()?;

    let replies = answer_text(&kb, question);
    if replies.is_empty() {
        println!("(no reply)");
        return Ok(());
    }

    for (i, reply) in replies.iter().enumerate() {
        if i > 0 {
            println!();
        }
        println!("{}", reply);
    }
    Ok(())
}
