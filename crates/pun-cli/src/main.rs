//! pun CLI

use clap::{Parser, Subcommand, ValueEnum};
use pun_codegen::{CodeGen, EmitOptions, PythonBackend};
use pun_error::{Diagnostic, DiagnosticRenderer, Diagnostics, SourceCache};
use pun_lexer::{Lexer, TokenKind};
use pun_lower::{lower_module, LowerOptions, Strategy};
use pun_parser::{parse, Module};
use std::fs;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::process;
use tracing::{debug, info, Level};

/// How lowered cases are emitted
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
enum StrategyArg {
    /// One boolean expression per case, binding with `:=` (default)
    #[default]
    Expression,
    /// Guarded statements and a case selector, no `:=`
    Statements,
}

impl From<StrategyArg> for Strategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Expression => Strategy::Expression,
            StrategyArg::Statements => Strategy::Statements,
        }
    }
}

#[derive(Parser)]
#[command(name = "pun")]
#[command(version)]
#[command(about = "Lowers Python match statements into plain conditionals", long_about = None)]
struct Cli {
    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Lowers a file and prints the result
    Lower {
        /// Input file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file (default: stdout)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        #[arg(short, long, default_value = "expression")]
        strategy: StrategyArg,

        /// Indentation width of the emitted source
        #[arg(long, default_value_t = 4)]
        indent: usize,
    },

    /// Parses and lowers a file, reporting errors only
    Check {
        /// Input file
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },

    /// Shows file tokens (debug)
    Tokens {
        /// Input file
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },

    /// Shows file syntax tree (debug)
    Ast {
        /// Input file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Print as JSON instead of the debug format
        #[arg(long)]
        json: bool,
    },

    /// Lowers a file, then evaluates it
    Run {
        /// Input file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        #[arg(short, long, default_value = "expression")]
        strategy: StrategyArg,
    },
}

/// A loaded source file with the cache its diagnostics render against
struct Session {
    cache: SourceCache,
    source: String,
    file_id: u32,
}

impl Session {
    fn open(path: &Path) -> Self {
        let source = match fs::read_to_string(path) {
            Ok(source) => source,
            Err(e) => {
                eprintln!("Error reading {}: {}", path.display(), e);
                process::exit(1);
            }
        };
        let mut cache = SourceCache::new();
        let file_id = cache.add(path.display().to_string(), source.as_str());
        Self {
            cache,
            source,
            file_id,
        }
    }

    fn renderer(&self) -> DiagnosticRenderer<'_> {
        let renderer = DiagnosticRenderer::new(&self.cache);
        if std::io::stderr().is_terminal() {
            renderer
        } else {
            renderer.without_colors()
        }
    }

    fn report(&self, diagnostics: &Diagnostics) {
        if !diagnostics.is_empty() {
            eprint!("{}", diagnostics.render_with(&self.renderer()));
        }
    }

    fn fail(&self, diagnostic: Diagnostic) -> ! {
        eprint!("{}", self.renderer().render(&diagnostic));
        process::exit(1);
    }

    /// Lexes and parses, exiting on any error
    fn parse(&self) -> Module {
        let mut lexer = Lexer::new(&self.source, self.file_id);
        let tokens = lexer.tokenize();
        let mut diagnostics = lexer.take_diagnostics();
        debug!(tokens = tokens.len(), "lexed");

        let (module, parse_diags) = parse(tokens);
        diagnostics.extend(parse_diags);
        self.report(&diagnostics);
        if diagnostics.has_errors() {
            process::exit(1);
        }
        debug!(statements = module.body.len(), "parsed");
        module
    }

    fn lower(&self, options: &LowerOptions) -> Module {
        let module = self.parse();
        match lower_module(&module, options) {
            Ok(lowered) => lowered,
            Err(e) => self.fail(e.into()),
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Lower {
            input,
            output,
            strategy,
            indent,
        } => {
            let session = Session::open(&input);
            let options = LowerOptions {
                strategy: strategy.into(),
            };
            let lowered = session.lower(&options);
            let backend = PythonBackend::with_options(EmitOptions {
                indent_width: indent,
            });
            let code = backend.generate(&lowered);

            match output {
                Some(path) => {
                    if let Err(e) = fs::write(&path, &code) {
                        eprintln!("Error writing {}: {}", path.display(), e);
                        process::exit(1);
                    }
                    info!(output = %path.display(), strategy = %options.strategy, "lowered");
                }
                None => print!("{}", code),
            }
        }

        Commands::Check { input } => {
            let session = Session::open(&input);
            let lowered = session.lower(&LowerOptions::default());
            println!(
                "{}: ok ({} statements after lowering)",
                input.display(),
                lowered.body.len()
            );
        }

        Commands::Tokens { input } => {
            let session = Session::open(&input);
            let mut lexer = Lexer::new(&session.source, session.file_id);
            let tokens = lexer.tokenize();

            for token in &tokens {
                let kind_str = format!("{:?}", token.kind);
                let display = match &token.kind {
                    TokenKind::Newline => "↵".to_string(),
                    TokenKind::Indent => "→".to_string(),
                    TokenKind::Dedent => "←".to_string(),
                    TokenKind::Eof => "EOF".to_string(),
                    _ => format!("{}", token.kind),
                };

                println!(
                    "  {:4}:{:<3}  {:<20}  {}",
                    token.span.start.line,
                    token.span.start.column,
                    kind_str.chars().take(20).collect::<String>(),
                    display
                );
            }

            println!("\nTotal: {} tokens", tokens.len());

            let diagnostics = lexer.take_diagnostics();
            session.report(&diagnostics);
            if diagnostics.has_errors() {
                process::exit(1);
            }
        }

        Commands::Ast { input, json } => {
            let session = Session::open(&input);
            let module = session.parse();
            if json {
                match serde_json::to_string_pretty(&module) {
                    Ok(text) => println!("{}", text),
                    Err(e) => {
                        eprintln!("Error serializing syntax tree: {}", e);
                        process::exit(1);
                    }
                }
            } else {
                println!("{:#?}", module);
            }
        }

        Commands::Run { input, strategy } => {
            let session = Session::open(&input);
            let options = LowerOptions {
                strategy: strategy.into(),
            };
            let lowered = session.lower(&options);

            let mut interpreter = pun_eval::Interpreter::new();
            let result = interpreter.run(&lowered);
            print!("{}", interpreter.take_output());
            if let Err(e) = result {
                session.fail(e.to_diagnostic());
            }
        }
    }
}
