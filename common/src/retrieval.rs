//! 候補検索（Retrieval）モジュール
//!
//! 分類表全体に対して固定順のパスを実行し、候補を集める。
//! 各パスは新しい候補を追加するだけで、先のパスで採用済みのコードを
//! 上書き・再採点しない（最初に採用したパスが勝つ）。
//!
//! | パス | スコア |
//! |------|--------|
//! | 完全一致 | 100 |
//! | 優先キーワード | 90 |
//! | キーワード/同義語 | 85 / 75 / 70 / 60 |
//! | クロスリファレンス | 80 |
//! | 業種共起 | 70 |
//! | 類似度 | 類似度 × 60 |

use crate::expander::{expand_synonyms, extract_negative_constraints, identify_industries};
use crate::keywords::{extract_keywords, OperatePattern};
use crate::lexicon::Lexicon;
use crate::similarity::{similarity, SimilarityParams};
use crate::table::ReferenceTable;
use crate::types::{MatchResult, MatchType, OccupationDefinition, QueryAnalysis, RetrievalResult};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

/// 検索パス（この順に実行）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatcherPass {
    Exact,
    PriorityKeyword,
    KeywordOrSynonym,
    CrossReference,
    Industry,
    Fuzzy,
}

impl MatcherPass {
    /// 実行順（優先順位そのもの）
    pub const ORDER: [MatcherPass; 6] = [
        MatcherPass::Exact,
        MatcherPass::PriorityKeyword,
        MatcherPass::KeywordOrSynonym,
        MatcherPass::CrossReference,
        MatcherPass::Industry,
        MatcherPass::Fuzzy,
    ];
}

/// 検索の調整用定数
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetrievalConfig {
    /// この類似度を超えた場合だけ採用
    pub fuzzy_threshold: f64,
    /// 類似度に掛ける係数
    pub fuzzy_weight: f64,
    /// 優先キーワード・展開語の最小文字数
    pub min_term_chars: usize,
    pub similarity: SimilarityParams,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            fuzzy_threshold: 0.5,
            fuzzy_weight: 60.0,
            min_term_chars: 2,
            similarity: SimilarityParams::default(),
        }
    }
}

/// 候補検索器
///
/// 分類表と語彙は不変なので、複数スレッドから同時に使える。
#[derive(Debug, Clone)]
pub struct Retriever {
    table: Arc<ReferenceTable>,
    lexicon: Arc<Lexicon>,
    operate: Option<OperatePattern>,
    config: RetrievalConfig,
}

/// クエリ解析の途中結果（優先キーワードは QueryAnalysis に含めない）
struct AnalyzedQuery {
    analysis: QueryAnalysis,
    priority_keywords: Vec<String>,
    query_lower: String,
}

/// 採用済み候補の集合（コード重複と否定制約をここで弾く）
struct Admission<'a> {
    candidates: Vec<MatchResult>,
    seen: HashSet<String>,
    negatives: &'a [String],
}

impl<'a> Admission<'a> {
    fn new(negatives: &'a [String]) -> Self {
        Self {
            candidates: Vec::new(),
            seen: HashSet::new(),
            negatives,
        }
    }

    fn contains(&self, code: &str) -> bool {
        self.seen.contains(code)
    }

    fn admit(&mut self, occupation: &OccupationDefinition, score: f64, match_type: MatchType, reason: String) {
        if self.seen.contains(&occupation.code) {
            return;
        }
        if self
            .negatives
            .iter()
            .any(|neg| !neg.is_empty() && occupation.name.contains(neg.as_str()))
        {
            return;
        }

        self.seen.insert(occupation.code.clone());
        self.candidates.push(MatchResult {
            occupation: occupation.clone(),
            score: score.clamp(0.0, 100.0),
            match_type,
            match_reason: reason,
        });
    }
}

impl Retriever {
    pub fn new(table: Arc<ReferenceTable>, lexicon: Arc<Lexicon>) -> Self {
        let operate = OperatePattern::from_lexicon(&lexicon);
        Self {
            table,
            lexicon,
            operate,
            config: RetrievalConfig::default(),
        }
    }

    pub fn with_config(mut self, config: RetrievalConfig) -> Self {
        self.config = config;
        self
    }

    pub fn table(&self) -> &ReferenceTable {
        &self.table
    }

    pub fn lexicon(&self) -> &Lexicon {
        &self.lexicon
    }

    pub fn config(&self) -> &RetrievalConfig {
        &self.config
    }

    /// クエリ解析だけを行う
    pub fn analyze(&self, query: &str) -> QueryAnalysis {
        self.analyze_query(query).analysis
    }

    /// 候補を検索
    ///
    /// 空白のみのクエリは候補0件。`limit` が0の場合は1として扱う。
    pub fn retrieve(&self, query: &str, limit: usize) -> RetrievalResult {
        let limit = limit.max(1);

        if query.trim().is_empty() {
            return RetrievalResult {
                candidates: Vec::new(),
                query_analysis: QueryAnalysis {
                    original_query: query.to_string(),
                    ..Default::default()
                },
            };
        }

        let analyzed = self.analyze_query(query);
        debug!(
            keywords = ?analyzed.analysis.extracted_keywords,
            priority = ?analyzed.priority_keywords,
            industries = ?analyzed.analysis.possible_industries,
            negatives = ?analyzed.analysis.negative_constraints,
            "query analyzed"
        );

        let mut admission = Admission::new(&analyzed.analysis.negative_constraints);
        for pass in MatcherPass::ORDER {
            let before = admission.candidates.len();
            self.run_pass(pass, &analyzed, &mut admission);
            debug!(?pass, added = admission.candidates.len() - before, "pass finished");
        }

        let mut candidates = admission.candidates;
        // sort_by は安定ソート（同点は採用順）
        candidates.sort_by(|a, b| b.score.total_cmp(&a.score));
        candidates.truncate(limit);

        RetrievalResult {
            candidates,
            query_analysis: analyzed.analysis,
        }
    }

    fn analyze_query(&self, query: &str) -> AnalyzedQuery {
        let extraction = extract_keywords(query, &self.lexicon, self.operate.as_ref());
        let expanded_terms = expand_synonyms(&extraction.keywords, &self.lexicon);
        let possible_industries = identify_industries(&expanded_terms, &self.lexicon);
        let negative_constraints = extract_negative_constraints(query, &self.lexicon.negation_markers);

        AnalyzedQuery {
            analysis: QueryAnalysis {
                original_query: query.to_string(),
                extracted_keywords: extraction.keywords,
                expanded_terms,
                possible_industries,
                negative_constraints,
            },
            priority_keywords: extraction.priority_keywords,
            query_lower: query.trim().to_lowercase(),
        }
    }

    fn run_pass(&self, pass: MatcherPass, query: &AnalyzedQuery, admission: &mut Admission) {
        match pass {
            MatcherPass::Exact => self.match_exact(query, admission),
            MatcherPass::PriorityKeyword => self.match_priority(query, admission),
            MatcherPass::KeywordOrSynonym => self.match_keywords(query, admission),
            MatcherPass::CrossReference => self.match_cross_references(query, admission),
            MatcherPass::Industry => self.match_industry(query, admission),
            MatcherPass::Fuzzy => self.match_fuzzy(query, admission),
        }
    }

    fn is_usable_term(&self, term: &str) -> bool {
        term.chars().count() >= self.config.min_term_chars
    }

    fn match_exact(&self, query: &AnalyzedQuery, admission: &mut Admission) {
        for occ in self.table.rows() {
            if occ.code.to_lowercase() == query.query_lower {
                admission.admit(occ, 100.0, MatchType::Exact, format!("代码精确匹配: {}", occ.code));
            } else if occ.name.to_lowercase() == query.query_lower {
                admission.admit(occ, 100.0, MatchType::Exact, format!("名称精确匹配: {}", occ.name));
            }
        }
    }

    fn match_priority(&self, query: &AnalyzedQuery, admission: &mut Admission) {
        for term in &query.priority_keywords {
            if !self.is_usable_term(term) {
                continue;
            }
            for occ in self.table.rows() {
                if occ.name.contains(term.as_str()) {
                    admission.admit(
                        occ,
                        90.0,
                        MatchType::PriorityKeyword,
                        format!("核心关键词匹配: \"{}\" in \"{}\"", term, occ.name),
                    );
                }
            }
        }
    }

    fn match_keywords(&self, query: &AnalyzedQuery, admission: &mut Admission) {
        let keywords = &query.analysis.extracted_keywords;

        for term in &query.analysis.expanded_terms {
            if !self.is_usable_term(term) {
                continue;
            }
            let is_original = keywords.contains(term);
            let is_priority = query.priority_keywords.contains(term);

            for occ in self.table.rows() {
                let name_hit = occ.name.contains(term.as_str());
                let group_hit = occ.group.contains(term.as_str());
                if !name_hit && !group_hit {
                    continue;
                }
                // 名称ヒットの優先キーワードは前のパスで処理済み
                if is_priority && name_hit {
                    continue;
                }

                let score = match (name_hit, is_original) {
                    (true, true) => 85.0,
                    (true, false) => 75.0,
                    (false, true) => 70.0,
                    (false, false) => 60.0,
                };
                let (match_type, label) = if is_original {
                    (MatchType::Keyword, "关键词")
                } else {
                    (MatchType::Synonym, "同义词")
                };
                let location = if name_hit { "名称" } else { "组别" };
                admission.admit(
                    occ,
                    score,
                    match_type,
                    format!("{}匹配: \"{}\" in {}", label, term, location),
                );
            }
        }
    }

    fn match_cross_references(&self, query: &AnalyzedQuery, admission: &mut Admission) {
        for cross_ref in &self.lexicon.cross_references {
            let key = cross_ref.trigger.as_str();
            if key.is_empty() {
                continue;
            }
            let triggered = query
                .analysis
                .expanded_terms
                .iter()
                .filter(|t| !t.is_empty())
                .any(|t| t.contains(key) || key.contains(t.as_str()));
            if !triggered {
                continue;
            }

            for occ in self.table.rows() {
                let hit = cross_ref
                    .name_patterns
                    .iter()
                    .any(|p| !p.is_empty() && occ.name.contains(p.as_str()));
                if hit {
                    admission.admit(
                        occ,
                        80.0,
                        MatchType::SpecialCrossRef,
                        format!("特殊匹配: \"{}\" → \"{}\"", key, occ.name),
                    );
                }
            }
        }
    }

    fn match_industry(&self, query: &AnalyzedQuery, admission: &mut Admission) {
        let industries = &query.analysis.possible_industries;
        if industries.is_empty() {
            return;
        }

        for occ in self.table.rows() {
            if !industries.contains(&occ.industry) {
                continue;
            }
            let hit = query
                .analysis
                .expanded_terms
                .iter()
                .filter(|t| !t.is_empty())
                .any(|t| occ.group.contains(t.as_str()) || occ.name.contains(t.as_str()));
            if hit {
                admission.admit(
                    occ,
                    70.0,
                    MatchType::Industry,
                    format!("行业匹配: {} - {}", occ.industry, occ.group),
                );
            }
        }
    }

    fn match_fuzzy(&self, query: &AnalyzedQuery, admission: &mut Admission) {
        let params = &self.config.similarity;
        let keywords: Vec<String> = query
            .analysis
            .extracted_keywords
            .iter()
            .map(|k| k.to_lowercase())
            .collect();

        for occ in self.table.rows() {
            if admission.contains(&occ.code) {
                continue;
            }
            let name = occ.name.to_lowercase();

            let best = keywords
                .iter()
                .map(|k| similarity(k, &name, params))
                .fold(similarity(&query.query_lower, &name, params), f64::max);

            if best > self.config.fuzzy_threshold {
                admission.admit(
                    occ,
                    best * self.config.fuzzy_weight,
                    MatchType::Fuzzy,
                    format!("相似度匹配: {:.0}%", best * 100.0),
                );
            }
        }
    }
}
