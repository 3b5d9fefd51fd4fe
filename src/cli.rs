use {
    crate::common,
    backend::Assembly,
    clap::{Parser, Subcommand},
    frontend::ast::Ast,
    middle::Normalized,
    std::path::PathBuf,
};

#[derive(Debug, Parser)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Compile a program to assembly
    Compile {
        /// Input source file
        input_path: PathBuf,

        #[command(flatten)]
        compile_options: CompileOptions,
    },
    /// Print a program after folding and desugaring
    Fold {
        /// Input source file
        input_path: PathBuf,
    },
}

#[derive(Debug, Parser)]
struct CompileOptions {
    /// Output file for generated assembly [leave unspecified for stdout]
    #[arg(short)]
    output_path: Option<PathBuf>,
}

pub(crate) fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    common::init_logging(cli.debug);
    let (input_path, compile_options) = match cli.command {
        Command::Compile {
            input_path,
            compile_options,
        } => (input_path, Some(compile_options)),
        Command::Fold { input_path } => (input_path, None),
    };
    let src = std::fs::read_to_string(input_path)?;
    let ast = Ast::try_from(&*src)?;
    log::debug!("{ast:#?}");
    let program = Normalized::try_from(ast)?;
    let Some(compile_options) = compile_options else {
        for form in &program.0.forms {
            println!("{form}");
        }
        return Ok(());
    };
    let assembly = Assembly::try_from(&program)?;
    if let Some(output_path) = compile_options.output_path {
        std::fs::write(output_path, assembly.to_string())?;
    } else {
        print!("{assembly}");
    }
    Ok(())
}
