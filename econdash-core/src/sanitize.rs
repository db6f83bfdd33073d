//! Display name → file base name.
//!
//! Spaces become underscores and a fixed set of punctuation is dropped with no
//! replacement. Nothing else is touched, so `&`, `.`, `=` and non-ASCII letters
//! survive as-is.

/// Characters removed outright from a display name.
pub const REMOVED_CHARS: [char; 4] = ['(', ')', '-', '/'];

/// Character that replaces each space.
pub const SPACE_REPLACEMENT: char = '_';

/// Sanitize a display name into a file base name (no extension).
///
/// Replacement happens before removal; the two character sets are disjoint so
/// the order never changes the result.
pub fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if c == ' ' { SPACE_REPLACEMENT } else { c })
        .filter(|c| !REMOVED_CHARS.contains(c))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn treasury_yield_drops_parentheses() {
        assert_eq!(
            sanitize("US 10Y Treasury Yield (TNX)"),
            "US_10Y_Treasury_Yield_TNX"
        );
    }

    #[test]
    fn plain_words_get_underscores() {
        assert_eq!(sanitize("WTI Crude Oil"), "WTI_Crude_Oil");
    }

    #[test]
    fn hyphen_inside_parentheses_is_removed() {
        assert_eq!(sanitize("Bitcoin (BTC-USD)"), "Bitcoin_BTCUSD");
    }

    #[test]
    fn slash_is_removed_not_replaced() {
        assert_eq!(sanitize("USD/JPY"), "USDJPY");
    }

    #[test]
    fn t_bill_hyphen_is_removed() {
        assert_eq!(sanitize("US 13W T-Bill Rate (IRX)"), "US_13W_TBill_Rate_IRX");
    }

    #[test]
    fn ampersand_survives() {
        assert_eq!(sanitize("S&P 500"), "S&P_500");
    }

    #[test]
    fn consecutive_spaces_each_become_underscores() {
        assert_eq!(sanitize("a  b"), "a__b");
    }

    #[test]
    fn empty_name_stays_empty() {
        assert_eq!(sanitize(""), "");
        assert_eq!(sanitize("()-/"), "");
    }
}
