use occupation_ai_common::DecisionSource;
use occupation_ai_rust::classifier;
use occupation_ai_rust::config::Config;
use occupation_ai_rust::provider::OpenRouterProvider;
use std::time::Duration;

#[tokio::test]
async fn openrouter_decision_integration() {
    let api_key = match std::env::var("OPENROUTER_API_KEY") {
        Ok(key) if !key.trim().is_empty() => key,
        _ => {
            eprintln!("OPENROUTER_API_KEY not set; skipping integration test");
            return;
        }
    };

    let config = Config::default();
    let provider = OpenRouterProvider::new(api_key, config.get_model());
    let retriever = classifier::build_retriever(&config, None, None).expect("bundled table");

    let response = classifier::classify(&retriever, "焊工", 10, Some(&provider), true, Duration::from_secs(60))
        .await
        .expect("classify failed");

    let decision = response.ai_decision.expect("decision missing");
    assert_ne!(decision.source, DecisionSource::Fallback, "provider call fell back: {}", decision.reasoning);
    assert!(!response.results.is_empty());
    assert!(decision.confidence <= 100);
}
