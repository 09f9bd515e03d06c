use clap::Parser;
use occupation_ai_common::rates::{rate_for, rate_table};
use occupation_ai_common::{total_premium, ClassificationResponse, OccupationResult, QuoteItem, ReferenceTable};
use occupation_ai_rust::{classifier, cli, config, error, provider};
use cli::{Cli, Commands};
use config::Config;
use error::{OccupationAiError, Result};
use provider::CompletionProvider;
use tracing::warn;

fn init_logging(verbose: bool) {
    let filter = if verbose {
        tracing_subscriber::EnvFilter::new("debug")
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// AIプロバイダを用意（OpenRouterのキー未設定ならローカル検索に切り替え）
fn prepare_provider(cli: &Cli, config: &Config, no_ai: bool) -> Result<Option<Box<dyn CompletionProvider>>> {
    if no_ai {
        return Ok(None);
    }
    match provider::build_provider(cli.ai_provider, config) {
        Ok(p) => Ok(Some(p)),
        Err(OccupationAiError::MissingApiKey) => {
            warn!("OPENROUTER_API_KEY not set, using local retrieval only");
            println!("⚠ APIキー未設定のため本地匹配のみ実行します\n");
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

fn print_response(response: &ClassificationResponse) {
    let analysis = &response.query_analysis;
    println!("关键词: {}", analysis.extracted_keywords.join(", "));
    if !analysis.possible_industries.is_empty() {
        println!("可能的行业: {}", analysis.possible_industries.join(", "));
    }
    if !analysis.negative_constraints.is_empty() {
        println!("排除约束: {}", analysis.negative_constraints.join(", "));
    }
    println!();

    for (i, result) in response.results.iter().enumerate() {
        let rate = rate_for(result.category);
        println!(
            "[{}] {} {}  {}  {}  (¥{}/人)",
            i + 1,
            result.code,
            result.standard_name,
            result.industry,
            result.category,
            rate.price
        );
        println!("    {} (置信度 {:.0}%)", result.description, result.confidence_score * 100.0);
    }

    if let Some(decision) = &response.ai_decision {
        println!();
        println!("AI决策: 置信度 {}%  来源 {:?}", decision.confidence, decision.source);
        println!("  理由: {}", decision.reasoning);
        if decision.need_more_info {
            println!("  需要更多信息");
            for q in decision.suggested_questions.iter().flatten() {
                println!("  - {}", q);
            }
        }
    }

    if let Some(message) = &response.message {
        println!("\n{}", message);
    }
}

fn print_report(table: &ReferenceTable) {
    let report = table.verify();
    println!("总记录数: {}", report.total);

    println!("\n按风险等级:");
    for rate in rate_table() {
        let count = report.by_category.get(&rate.category.value()).copied().unwrap_or(0);
        println!("  {}: {}", rate.label, count);
    }

    println!("\n行业 (前10):");
    for (industry, count) in report.top_industries(10) {
        println!("  {}: {}", industry, count);
    }

    println!("\n职业类别 (前10):");
    for (group, count) in report.top_groups(10) {
        println!("  {}: {}", group, count);
    }

    if report.duplicate_codes.is_empty() {
        println!("\n✔ 代码重复なし");
    } else {
        println!("\n⚠ 重复代码 ({}件): {}", report.duplicate_codes.len(), report.duplicate_codes.join(", "));
    }
    if report.incomplete_records.is_empty() {
        println!("✔ 欠損なし");
    } else {
        println!("⚠ 不完整记录 ({}件):", report.incomplete_records.len());
        for (line, code) in &report.incomplete_records {
            println!("  #{} {}", line, code);
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let config = Config::load()?;

    match &cli.command {
        Commands::Classify { query, limit, no_ai, no_few_shot, json } => {
            let retriever = classifier::build_retriever(&config, cli.table.as_deref(), cli.lexicon.as_deref())?;
            let provider = prepare_provider(&cli, &config, *no_ai)?;
            let limit = limit.unwrap_or(config.retrieval_limit);
            let use_few_shot = config.use_few_shot && !no_few_shot;

            if !json {
                println!("🔍 occ-ai - 职业分类\n");
                println!("查询: \"{}\"", query.trim());
            }

            let response = classifier::classify(
                &retriever,
                query,
                limit,
                provider.as_deref(),
                use_few_shot,
                config.timeout(),
            )
            .await?;

            if *json {
                println!("{}", serde_json::to_string_pretty(&response)?);
            } else {
                print_response(&response);
            }
        }

        Commands::Search { query, limit } => {
            let retriever = classifier::build_retriever(&config, cli.table.as_deref(), cli.lexicon.as_deref())?;
            let hits = retriever.table().search(query);
            println!("🔎 \"{}\": {}件\n", query, hits.len());
            for occ in hits.iter().take(*limit) {
                println!("{}  {}  {} > {}  {}", occ.code, occ.name, occ.industry, occ.group, occ.category);
            }
        }

        Commands::Batch { file, output, no_ai, limit } => {
            let retriever = classifier::build_retriever(&config, cli.table.as_deref(), cli.lexicon.as_deref())?;
            let provider = prepare_provider(&cli, &config, *no_ai)?;
            let queries = classifier::read_queries(file)?;
            let limit = limit.unwrap_or(config.retrieval_limit);

            if output.is_some() {
                println!("📋 occ-ai - 一括分類 ({}件)\n", queries.len());
            }

            let records = classifier::classify_batch(
                &retriever,
                &queries,
                limit,
                provider.as_deref(),
                config.use_few_shot,
                config.timeout(),
                output.is_some(),
            )
            .await;

            let json = serde_json::to_string_pretty(&records)?;
            match output {
                Some(path) => {
                    std::fs::write(path, json)?;
                    let unmatched = records.iter().filter(|r| r.response.results.is_empty()).count();
                    println!("✔ 結果を保存: {}", path.display());
                    println!("  分類: {}件 / 未匹配: {}件", records.len() - unmatched, unmatched);
                }
                None => println!("{}", json),
            }
        }

        Commands::Verify => {
            let retriever = classifier::build_retriever(&config, cli.table.as_deref(), cli.lexicon.as_deref())?;
            println!("📊 occ-ai - 数据验证\n");
            print_report(retriever.table());
        }

        Commands::Import { markdown, output } => {
            println!("📥 occ-ai - Markdown変換\n");
            let table = classifier::load_table(markdown)?;
            let output = output.clone().unwrap_or_else(|| markdown.with_extension("json"));
            std::fs::write(&output, table.to_json()?)?;
            println!("✔ {}件の職業を変換: {}\n", table.len(), output.display());
            print_report(&table);
        }

        Commands::Quote { items } => {
            let retriever = classifier::build_retriever(&config, cli.table.as_deref(), cli.lexicon.as_deref())?;
            let mut quote = Vec::new();

            for item in items {
                let Some((code, count)) = cli::parse_quote_item(item) else {
                    println!("⚠ 無効な指定: {}", item);
                    continue;
                };
                match retriever.table().find_by_code(&code) {
                    Some(occ) => quote.push(QuoteItem::new(OccupationResult::new(occ, String::new(), 1.0), count)),
                    None => println!("⚠ 代码不存在: {}", code),
                }
            }

            println!("💰 occ-ai - 保费估算\n");
            for item in &quote {
                let occ = &item.occupation;
                if item.needs_manual_review() {
                    println!("{} {}  {}人  拒保/人工核保", occ.code, occ.standard_name, item.count);
                } else {
                    println!(
                        "{} {}  {}  {}人 × ¥{} = ¥{}",
                        occ.code,
                        occ.standard_name,
                        occ.category,
                        item.count,
                        item.base_premium,
                        item.subtotal()
                    );
                }
            }
            println!("\n合计: ¥{}", total_premium(&quote));
        }

        Commands::Config { set_api_key, show } => {
            let mut config = config;

            if let Some(key) = set_api_key {
                config.set_api_key(key.clone())?;
                println!("✔ APIキーを設定しました");
            }

            if *show {
                println!("設定: {}", Config::config_path()?.display());
                println!("  モデル: {}", config.get_model());
                println!("  タイムアウト: {}秒", config.timeout_seconds);
                println!("  検索候補数: {}", config.retrieval_limit);
                println!("  Few-Shot: {}", if config.use_few_shot { "有効" } else { "無効" });
                println!(
                    "  職業分類表: {}",
                    config.table_path.as_ref().map(|p| p.display().to_string()).unwrap_or_else(|| "同梱".into())
                );
                if let Some(path) = &config.lexicon_path {
                    println!("  語彙: {}", path.display());
                }
                println!("  APIキー: {}", if config.get_api_key().is_ok() { "設定済み" } else { "未設定" });
            }
        }
    }

    Ok(())
}
