//! 命令行接口
//!
//! 运维用途：线索日志导出 CSV、生成示例配置

use clap::{Parser, Subcommand};
use colored::Colorize;

use crate::capture::LeadJournal;
use crate::config::{Config, get_config};
use crate::utils::csv_handler;

#[derive(Parser)]
#[command(name = "leadgate", version, about = "Lead capture and attribution gateway")]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 导出线索日志为 CSV
    Export {
        /// 输出文件路径（缺省为带时间戳的文件名）
        #[arg(short, long)]
        output: Option<String>,
    },
    /// 配置管理
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// 生成示例配置
    Generate {
        /// 写入文件；缺省打印到标准输出
        #[arg(short, long)]
        output: Option<String>,
    },
}

/// CLI 模式入口
pub async fn run_cli() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Export { output } => export_leads(output),
        Commands::Config { action } => match action {
            ConfigCommands::Generate { output } => generate_config(output),
        },
    }
}

fn export_leads(output: Option<String>) {
    let config = get_config();
    let journal = LeadJournal::new(&config.journal.file);

    if journal.is_empty() {
        println!("{}", "No leads in journal, nothing to export".yellow());
        return;
    }

    let leads = journal.all();
    let path = output.unwrap_or_else(csv_handler::generate_export_filename);

    match csv_handler::export_to_csv(&leads, &path) {
        Ok(()) => {
            println!(
                "{} Exported {} lead(s) to {}",
                "✓".green().bold(),
                leads.len().to_string().cyan(),
                path.cyan()
            );
        }
        Err(e) => {
            eprintln!("{}", e.format_colored());
            std::process::exit(1);
        }
    }
}

fn generate_config(output: Option<String>) {
    let sample = Config::generate_sample_config();

    match output {
        Some(path) => match std::fs::write(&path, &sample) {
            Ok(()) => println!("{} Sample config written to {}", "✓".green().bold(), path.cyan()),
            Err(e) => {
                eprintln!("{} Failed to write {}: {}", "[ERROR]".red().bold(), path, e);
                std::process::exit(1);
            }
        },
        None => print!("{}", sample),
    }
}
