use std::path::{Path, PathBuf};

use color_print::cprintln;
use pgasm::{dump::SymbolDump, error::Error, Assembler};

const HELP_TEMPLATE: &str = "\
{before-help}{bin} {version}
  {author}
  {about}

{usage-heading}
{tab}{usage}

{all-args}{after-help}";

#[derive(Debug, clap::Parser)]
#[clap(author, version, about, help_template = HELP_TEMPLATE)]
struct Args {
    /// Input file
    input: String,

    /// Write the symbol table to <stem>.sym
    #[clap(short, long)]
    intermediate: bool,

    /// Dump the listing
    #[clap(short, long)]
    dump: bool,
}

fn with_extension(path: &str, ext: &str) -> PathBuf {
    Path::new(path).with_extension(ext)
}

fn write(path: &Path, content: &str) -> Result<(), Error> {
    let name = path.display().to_string();
    std::fs::write(path, content).map_err(|err| Error::FileWrite(name, err))
}

fn run(args: &Args) -> Result<bool, Error> {
    println!("PG16 Assembler");

    println!("1. Read File");
    println!("  < {}", args.input);
    let source = std::fs::read_to_string(&args.input)
        .map_err(|err| Error::FileOpen(args.input.clone(), err))?;
    let mut asm = Assembler::new(&source);

    println!("2. Pass 1: Assign Addresses");
    asm.pass1();
    println!(
        "  {} symbols, {} literals",
        asm.symbols.len(),
        asm.literals.len()
    );

    if args.intermediate {
        let path = with_extension(&args.input, "sym");
        println!("  > {}", path.display());
        write(&path, &SymbolDump::new(&asm).to_yaml()?)?;
    }

    println!("3. Pass 2: Generate Code");
    let output = asm.pass2();
    asm.msgs.dump(&args.input, &asm.raw_lines());

    if args.dump {
        output.listing.print(&args.input, &asm.lines);
    }

    println!("4. Write Object");
    match output.object {
        Some(object) => {
            let path = with_extension(&args.input, "obj");
            println!("  > {}", path.display());
            write(&path, &object.to_string())?;
            Ok(true)
        }
        None => {
            cprintln!("<red,bold>error</>: object not written due to previous errors");
            Ok(false)
        }
    }
}

fn main() {
    use clap::Parser;

    let args: Args = Args::parse();
    match run(&args) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(err) => {
            err.print_diag(&args.input, &[], None);
            std::process::exit(1);
        }
    }
}
