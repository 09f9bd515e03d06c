//! 同義語・業種展開と否定制約の抽出
//!
//! - expand_synonyms: 同義語表による1段の近似閉包（推移的には展開しない）
//! - identify_industries: トリガー語との双方向部分一致で業種を推定
//! - extract_negative_constraints: 否定マーカー直後の語を除外語として取り出す

use crate::keywords::push_unique;
use crate::lexicon::Lexicon;

/// 否定マーカーの直後から取り出す最大文字数
pub const NEGATIVE_CAPTURE_CHARS: usize = 10;

/// 同義語展開
///
/// 各キーワードについて
/// 1. 見出し語に完全一致すればその変形をすべて追加
/// 2. 見出し語とキーワードのどちらかが他方を含めば、見出し語と変形を追加
///
/// 短い見出し語で過剰展開することがあるが、再現率を優先する。
pub fn expand_synonyms(keywords: &[String], lexicon: &Lexicon) -> Vec<String> {
    let mut expanded: Vec<String> = Vec::new();
    for keyword in keywords {
        push_unique(&mut expanded, keyword);
    }

    for keyword in keywords {
        if keyword.is_empty() {
            continue;
        }

        if let Some(variants) = lexicon.synonyms_of(keyword) {
            for variant in variants {
                push_unique(&mut expanded, variant);
            }
        }

        for group in &lexicon.synonyms {
            if group.term.is_empty() {
                continue;
            }
            if keyword.contains(group.term.as_str()) || group.term.contains(keyword.as_str()) {
                push_unique(&mut expanded, &group.term);
                for variant in &group.variants {
                    push_unique(&mut expanded, variant);
                }
            }
        }
    }

    expanded
}

/// 業種推定（複数可、排他なし）
pub fn identify_industries(terms: &[String], lexicon: &Lexicon) -> Vec<String> {
    let mut industries = Vec::new();

    for entry in &lexicon.industries {
        let hit = terms.iter().filter(|t| !t.is_empty()).any(|term| {
            entry
                .triggers
                .iter()
                .filter(|trigger| !trigger.is_empty())
                .any(|trigger| term.contains(trigger.as_str()) || trigger.contains(term.as_str()))
        });
        if hit {
            push_unique(&mut industries, &entry.industry);
        }
    }

    industries
}

/// 否定制約の抽出
///
/// マーカーが現れるたびに、直後に続く文字・数字（漢字を含む）の連なりを
/// 最大10文字まで取り出す。
pub fn extract_negative_constraints(query: &str, markers: &[String]) -> Vec<String> {
    let mut constraints = Vec::new();

    for marker in markers {
        if marker.is_empty() {
            continue;
        }
        for (idx, _) in query.match_indices(marker.as_str()) {
            let after = &query[idx + marker.len()..];
            let captured: String = after
                .chars()
                .take(NEGATIVE_CAPTURE_CHARS)
                .take_while(|c| c.is_alphanumeric())
                .collect();
            if !captured.is_empty() {
                push_unique(&mut constraints, &captured);
            }
        }
    }

    constraints
}
