//! Matching suggestions for imported bank entries
//!
//! Purely advisory: a deterministic text/amount heuristic over the entry's
//! statement description. Nothing here touches storage, and an entry with no
//! plausible match simply yields an empty list.

use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};

use crate::types::*;

/// Maximum number of suggestions returned per entry
pub const MAX_SUGGESTIONS: usize = 5;

/// Score for an overdue invoice whose payer's full name appears in the description
pub const INVOICE_PAYER_NAME_SCORE: u32 = 50;
/// Score for an overdue invoice whose payer's membership number appears
pub const INVOICE_MEMBERSHIP_SCORE: u32 = 40;
/// Score for an overdue invoice whose total matches the entry amount
pub const INVOICE_AMOUNT_SCORE: u32 = 30;
/// Score for a payer whose full name appears in the description
pub const PAYER_NAME_SCORE: u32 = 40;
/// Score for a payer whose membership number appears
pub const PAYER_MEMBERSHIP_SCORE: u32 = 35;

// Invoice totals within this distance of the entry amount count as a match
fn amount_tolerance() -> BigDecimal {
    BigDecimal::from(1) / BigDecimal::from(100)
}

/// What a suggestion points at
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Candidate {
    /// An overdue invoice the entry may settle
    Invoice(Invoice),
    /// A payer the entry may have come from
    Payer(Payer),
}

/// One ranked reconciliation candidate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    pub candidate: Candidate,
    pub score: u32,
}

fn contains_ci(haystack_lower: &str, needle: &str) -> bool {
    !needle.trim().is_empty() && haystack_lower.contains(&needle.to_lowercase())
}

/// Rank reconciliation candidates for a bank entry
///
/// Invoice candidates are drawn from `Overdue` invoices only; payer
/// candidates are scored regardless of invoice state. Scores are additive,
/// matching is case-insensitive, and ties keep the input iteration order.
pub fn suggest(entry: &BankEntry, invoices: &[Invoice], payers: &[Payer]) -> Vec<Suggestion> {
    let description = entry.description.to_lowercase();
    let entry_amount = entry.unsigned_amount();
    let tolerance = amount_tolerance();

    let mut suggestions = Vec::new();

    for invoice in invoices.iter().filter(|i| i.state == PaymentState::Overdue) {
        let mut score = 0;
        if let Some(payer) = payers.iter().find(|p| p.id == invoice.payer_id) {
            if contains_ci(&description, &payer.name) {
                score += INVOICE_PAYER_NAME_SCORE;
            }
            if let Some(number) = &payer.membership_number {
                if contains_ci(&description, number) {
                    score += INVOICE_MEMBERSHIP_SCORE;
                }
            }
        }
        if (&invoice.total - &entry_amount).abs() < tolerance {
            score += INVOICE_AMOUNT_SCORE;
        }
        if score > 0 {
            suggestions.push(Suggestion {
                candidate: Candidate::Invoice(invoice.clone()),
                score,
            });
        }
    }

    for payer in payers {
        let mut score = 0;
        if contains_ci(&description, &payer.name) {
            score += PAYER_NAME_SCORE;
        }
        if let Some(number) = &payer.membership_number {
            if contains_ci(&description, number) {
                score += PAYER_MEMBERSHIP_SCORE;
            }
        }
        if score > 0 {
            suggestions.push(Suggestion {
                candidate: Candidate::Payer(payer.clone()),
                score,
            });
        }
    }

    // Stable sort keeps original iteration order between equal scores
    suggestions.sort_by(|a, b| b.score.cmp(&a.score));
    suggestions.truncate(MAX_SUGGESTIONS);
    suggestions
}
