// src/main.rs

use acc8::driver::{self, CompileOptions, UnitReport};
use clap::Parser;
use std::fmt::Write as _;
use std::fs;
use std::path::PathBuf;
use std::process;
use tracing::Level;

/// 面向 8 位累加器机的玩具语言编译器
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// 需要编译的源文件路径
    input_file: PathBuf,

    /// 另外把所有成功生成的代码清单写入这个文件
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// 打印每个程序单元的 CST 与 AST
    #[arg(long)]
    trees: bool,

    /// 不打印 256 字节内存映像
    #[arg(long)]
    no_image: bool,

    /// 输出各阶段的调试日志
    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,

    /// 只输出警告及以上级别的日志
    #[arg(short, long)]
    quiet: bool,
}

fn init_logging(cli: &Cli) {
    let level = if cli.verbose {
        Level::DEBUG
    } else if cli.quiet {
        Level::WARN
    } else {
        Level::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();
}

fn print_unit(unit: &UnitReport, cli: &Cli) {
    println!("==================== Program {} ====================", unit.index);

    if cli.trees {
        if let Some(cst) = &unit.cst {
            println!("Concrete Syntax Tree:\n{}", cst);
        }
        if let Some(ast) = &unit.ast {
            println!("Abstract Syntax Tree:\n{}", ast);
        }
    }

    if let Some(symbols) = &unit.symbol_table {
        println!("{}", symbols);
    }

    match (&unit.code, unit.failed_stage) {
        (Some(code), _) => {
            println!("Generated Code:\n{}", code.listing);
            if !cli.no_image {
                println!("Memory Image:\n{}", code.image);
            }
        }
        (None, Some(stage)) => println!("Program {}: {} failed; later stages skipped.\n", unit.index, stage),
        (None, None) => {}
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(&cli);

    let options = CompileOptions { keep_trees: cli.trees };
    let (source, compilation) = driver::compile_file(&cli.input_file, &options)?;
    let source_name = cli.input_file.to_string_lossy().into_owned();

    for unit in &compilation.units {
        print_unit(unit, &cli);
        unit.diagnostics.print(&source_name, &source)?;
    }
    compilation.trailing.print(&source_name, &source)?;

    if let Some(path) = &cli.output {
        let mut listings = String::new();
        for unit in compilation.units.iter().filter(|u| u.succeeded()) {
            if let Some(code) = &unit.code {
                writeln!(listings, "; Program {}\n{}", unit.index, code.listing)?;
            }
        }
        fs::write(path, listings)?;
        println!("Code listings written to '{}'", path.display());
    }

    println!("{}", compilation.stats);

    if compilation.has_errors() {
        process::exit(1);
    }
    Ok(())
}
