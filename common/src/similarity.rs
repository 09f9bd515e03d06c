//! 文字列類似度（編集距離ベース）

/// 類似度計算のパラメータ
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimilarityParams {
    /// 長さの差が長い方の長さのこの割合を超えたら距離計算を省略
    pub length_disparity_ratio: f64,
    /// 省略時に返す固定の類似度
    pub disparity_similarity: f64,
}

impl Default for SimilarityParams {
    fn default() -> Self {
        Self {
            length_disparity_ratio: 0.5,
            disparity_similarity: 0.3,
        }
    }
}

/// 類似度を計算（0.0〜1.0、文字単位）
///
/// 長さが大きく異なる場合は距離を計算せず固定値を返す。
pub fn similarity(a: &str, b: &str, params: &SimilarityParams) -> f64 {
    if a == b {
        return 1.0;
    }
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let a_len = a.chars().count();
    let b_len = b.chars().count();
    let max_len = a_len.max(b_len);

    if a_len.abs_diff(b_len) as f64 > max_len as f64 * params.length_disparity_ratio {
        return params.disparity_similarity;
    }

    let distance = levenshtein_distance(a, b);
    1.0 - (distance as f64 / max_len as f64)
}

/// レーベンシュタイン距離を計算
pub fn levenshtein_distance(a: &str, b: &str) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    let a_len = a_chars.len();
    let b_len = b_chars.len();

    if a_len == 0 {
        return b_len;
    }
    if b_len == 0 {
        return a_len;
    }

    // 1行分だけ保持
    let mut prev: Vec<usize> = (0..=b_len).collect();
    let mut curr = vec![0; b_len + 1];

    for i in 1..=a_len {
        curr[0] = i;
        for j in 1..=b_len {
            let cost = if a_chars[i - 1] == b_chars[j - 1] { 0 } else { 1 };
            curr[j] = (prev[j] + 1).min(curr[j - 1] + 1).min(prev[j - 1] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b_len]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_similarity() {
        let params = SimilarityParams::default();
        assert!((similarity("焊工", "焊工", &params) - 1.0).abs() < 0.01);
        assert!(similarity("建筑焊工", "建筑电焊工", &params) > 0.5);
        assert!(similarity("厨师", "保安", &params) < 0.5);
    }

    #[test]
    fn test_similarity_empty() {
        let params = SimilarityParams::default();
        assert_eq!(similarity("", "焊工", &params), 0.0);
        assert_eq!(similarity("焊工", "", &params), 0.0);
    }

    #[test]
    fn test_similarity_length_disparity_short_circuit() {
        let params = SimilarityParams::default();
        // 2文字 vs 6文字: 差4 > 3
        assert_eq!(similarity("焊工", "建筑焊工室外", &params), 0.3);

        let tuned = SimilarityParams {
            length_disparity_ratio: 0.8,
            disparity_similarity: 0.1,
        };
        assert!((similarity("焊工", "建筑焊工室外", &tuned) - (2.0 / 6.0)).abs() < 1e-9);
    }

    #[test]
    fn test_levenshtein_distance() {
        assert_eq!(levenshtein_distance("", "abc"), 3);
        assert_eq!(levenshtein_distance("abc", "abc"), 0);
        assert_eq!(levenshtein_distance("abc", "abd"), 1);
        assert_eq!(levenshtein_distance("kitten", "sitting"), 3);
        assert_eq!(levenshtein_distance("堆高机司机", "叉车司机"), 3);
    }
}
