use clap::Parser as ClapParser;

use hasten::compile::{compile, CompileError, CompileOptions};

#[derive(ClapParser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Root IDL file; imports are resolved relative to its directory.
    input: std::path::PathBuf,

    /// Output directory for generated sources. Defaults to the input
    /// file's directory.
    #[clap(long, short = 'o')]
    out_dir: Option<std::path::PathBuf>,

    /// Only check the input for errors; emit nothing.
    #[clap(long, short = 'c')]
    check_only: bool,

    /// Comma-separated list of things to dump: ast,ir
    #[clap(long)]
    dump: Option<String>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let args = Args::parse();

    let mut options = CompileOptions {
        input: args.input,
        output_dir: args.out_dir,
        check_only: args.check_only,
        dump_ast: false,
        dump_ir: false,
    };

    if let Some(dump) = &args.dump {
        for item in dump.split(',').map(|s| s.trim().to_lowercase()) {
            match item.as_str() {
                "ast" => options.dump_ast = true,
                "ir" => options.dump_ir = true,
                "" => {}
                _ => eprintln!("[WARN] unknown dump flag: {item}"),
            }
        }
    }

    match compile(&options) {
        Ok(output) => {
            // Warnings and notes are still worth showing on success.
            let rendered = output.diagnostics.render();
            if !rendered.is_empty() {
                eprint!("{rendered}");
            }
            for emitted in &output.emitted {
                if emitted.written {
                    println!("generated {}", emitted.path.display());
                }
            }
        }
        Err(CompileError::Invalid(sink)) => {
            eprint!("{}", sink.render());
            std::process::exit(1);
        }
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(1);
        }
    }
}
