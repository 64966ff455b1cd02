use anyhow::Result;
use clap::{Parser, Subcommand};
use erpquery::catalog::Catalog;
use erpquery::chat::{looks_like_csv, ChatSession};
use erpquery::config::Settings;
use erpquery::db::{AnyDatabase, Database};
use erpquery::error::AssistantError;
use erpquery::llm::OpenAiCompatClient;
use erpquery::pipeline::QueryPipeline;
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "erpquery")]
#[command(about = "ERP 智慧查詢工具 - natural-language SQL assistant")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Load the table catalog from the database
    Tables {
        /// Write the catalog as a CSV that can be annotated with Chinese
        /// names and passed back via `query --catalog`
        #[arg(short, long)]
        save: Option<PathBuf>,
    },
    /// Run the natural-language-to-SQL pipeline
    Query {
        /// The request, in natural language
        text: String,
        /// Annotated table-list CSV to use instead of the live catalog
        #[arg(short, long)]
        catalog: Option<PathBuf>,
        /// Write the query result as CSV
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Chat against an embedded ERP JSON dataset
    Chat {
        /// Path to the dataset
        #[arg(short, long, default_value = "erp_data.json")]
        data: PathBuf,
    },
    /// Test the database connection
    Ping,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let settings = Settings::from_env();
    let db = Arc::new(AnyDatabase::new(settings.connection.clone()));

    match args.command {
        Command::Tables { save } => {
            let tables = db.list_tables(&settings.table_filter).await?;
            let catalog = Catalog::new(tables);
            println!("共 {} 張表：", catalog.len());
            for table in catalog.tables() {
                println!("  {}", table.name);
            }
            if let Some(path) = save {
                std::fs::write(&path, catalog.to_csv()?)?;
                println!("表清單已寫入 {} (可加中文名稱再上傳)", path.display());
            }
        }

        Command::Query { text, catalog, output } => {
            let catalog = match catalog {
                Some(path) => {
                    let catalog = Catalog::from_csv_path(&path)?;
                    info!(path = %path.display(), tables = catalog.len(), "已載入自訂表清單");
                    catalog
                }
                None => Catalog::new(db.list_tables(&settings.table_filter).await?),
            };
            if catalog.is_empty() {
                anyhow::bail!("請先載入或上傳表清單。");
            }

            let llm = Arc::new(OpenAiCompatClient::new(&settings.llm_endpoint, &settings.llm_model)?);
            let pipeline = QueryPipeline::new(llm, db);

            match pipeline.run(&text, &catalog).await {
                Ok(run) => {
                    println!("LLM 選出的表: {:?}", run.selected_tables);
                    println!("\n{}\n", run.sql);
                    println!("查詢完成，共 {} 筆資料", run.result.row_count());
                    println!("{}", run.result.to_display());
                    if let Some(path) = output {
                        std::fs::write(&path, run.result.to_csv()?)?;
                        println!("查詢結果已寫入 {}", path.display());
                    }
                }
                Err(AssistantError::MutationRejected { sql }) => {
                    println!("\n{}\n", sql);
                    eprintln!("偵測到 DML 語句，出於安全只允許 SELECT！");
                    std::process::exit(1);
                }
                Err(e) => {
                    eprintln!("{}", e);
                    std::process::exit(1);
                }
            }
        }

        Command::Chat { data } => {
            let raw = std::fs::read_to_string(&data)?;
            let dataset: serde_json::Value = serde_json::from_str(&raw)?;
            let llm = OpenAiCompatClient::new(&settings.llm_endpoint, &settings.llm_model)?;
            let mut session = ChatSession::new(&dataset)?;

            println!("ERP 聊天室（輸入 exit 離開）");
            let stdin = std::io::stdin();
            loop {
                print!("> ");
                std::io::stdout().flush()?;
                let mut line = String::new();
                if stdin.lock().read_line(&mut line)? == 0 {
                    break;
                }
                let question = line.trim();
                if question.is_empty() {
                    continue;
                }
                if question == "exit" {
                    break;
                }
                match session.ask(&llm, question).await {
                    Ok(answer) => {
                        println!("{}", answer);
                        if looks_like_csv(&answer) {
                            info!("回答為 CSV 格式，可匯入表格工具");
                        }
                    }
                    Err(e) => eprintln!("{}", e),
                }
            }
        }

        Command::Ping => match db.ping().await {
            Ok(()) => println!("SQL Server 連線成功！"),
            Err(e) => {
                eprintln!("{}", e);
                std::process::exit(1);
            }
        },
    }

    Ok(())
}
