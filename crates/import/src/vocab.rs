use billfold_core::{Category, CategoryId, CategoryKind, HubType, Money};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::{Arc, OnceLock};

use crate::error::ImportError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchKind {
    #[default]
    Contains,
    Regex,
}

impl FromStr for MatchKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "contains" => Ok(MatchKind::Contains),
            "regex" => Ok(MatchKind::Regex),
            other => Err(format!("unknown match kind: '{other}'")),
        }
    }
}

/// A merchant with a stable billing identity, used by recurring detection.
/// `pattern` is a lowercase substring of the statement description.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnownMerchant {
    pub pattern: String,
    pub display_name: String,
    pub category: CategoryId,
    pub typical_amount: Option<Money>,
}

/// Pattern paired with its precompiled regex (if applicable).
#[derive(Debug)]
struct CompiledPattern {
    pattern: String,
    matcher: PatternMatcher,
    category: CategoryId,
    priority: u8,
}

#[derive(Debug)]
enum PatternMatcher {
    Contains,
    Regex(regex::Regex),
}

impl CompiledPattern {
    fn matches(&self, lowered: &str, original: &str) -> bool {
        match &self.matcher {
            PatternMatcher::Contains => lowered.contains(&self.pattern),
            PatternMatcher::Regex(re) => re.is_match(original),
        }
    }
}

/// Immutable per-hub category dictionary: the categories themselves, the
/// merchant patterns that map descriptions onto them, and the known recurring
/// merchants. Loaded once per session, shared behind an `Arc`.
#[derive(Debug)]
pub struct Vocabulary {
    hub: HubType,
    categories: Vec<Category>,
    /// Income and transfer patterns sorted ahead of expense ones; declaration
    /// order preserved within a kind.
    patterns: Vec<CompiledPattern>,
    known_merchants: Vec<KnownMerchant>,
}

impl Vocabulary {
    pub fn builtin(hub: HubType) -> Arc<Vocabulary> {
        static PERSONAL: OnceLock<Arc<Vocabulary>> = OnceLock::new();
        static BUSINESS: OnceLock<Arc<Vocabulary>> = OnceLock::new();
        let cell = match hub {
            HubType::Personal => &PERSONAL,
            HubType::Business => &BUSINESS,
        };
        cell.get_or_init(|| {
            Arc::new(build_builtin(hub).expect("builtin vocabulary is well formed"))
        })
        .clone()
    }

    pub fn from_toml(text: &str) -> Result<Vocabulary, ImportError> {
        let file: VocabularyFile =
            toml::from_str(text).map_err(|e| ImportError::Vocabulary(e.to_string()))?;

        let categories = file
            .categories
            .iter()
            .map(|c| Category::new(&c.id, &c.name, c.kind))
            .collect();

        let patterns = file
            .patterns
            .into_iter()
            .map(|p| (p.pattern, p.match_kind, CategoryId::new(p.category)))
            .collect();

        let known_merchants = file
            .known_merchants
            .into_iter()
            .map(|k| {
                let typical_amount = match k.typical_amount.as_deref() {
                    Some(s) => Some(Decimal::from_str(s).map(Money::from_decimal).map_err(
                        |_| ImportError::Vocabulary(format!("bad typical_amount: '{s}'")),
                    )?),
                    None => None,
                };
                Ok(KnownMerchant {
                    pattern: k.pattern.to_lowercase(),
                    display_name: k.name,
                    category: CategoryId::new(k.category),
                    typical_amount,
                })
            })
            .collect::<Result<Vec<_>, ImportError>>()?;

        Self::assemble(file.hub, categories, patterns, known_merchants)
    }

    fn assemble(
        hub: HubType,
        categories: Vec<Category>,
        patterns: Vec<(String, MatchKind, CategoryId)>,
        known_merchants: Vec<KnownMerchant>,
    ) -> Result<Vocabulary, ImportError> {
        let mut kinds: HashMap<CategoryId, CategoryKind> = HashMap::new();
        for c in &categories {
            if kinds.insert(c.id.clone(), c.kind).is_some() {
                return Err(ImportError::Vocabulary(format!(
                    "duplicate category id: '{}'",
                    c.id
                )));
            }
        }

        let mut compiled = Vec::with_capacity(patterns.len());
        for (pattern, kind, category) in patterns {
            let cat_kind = *kinds.get(&category).ok_or_else(|| {
                ImportError::Vocabulary(format!(
                    "pattern '{pattern}' references unknown category '{category}'"
                ))
            })?;
            let matcher = match kind {
                MatchKind::Contains => PatternMatcher::Contains,
                MatchKind::Regex => PatternMatcher::Regex(regex::Regex::new(&pattern).map_err(
                    |e| ImportError::Vocabulary(format!("bad regex '{pattern}': {e}")),
                )?),
            };
            compiled.push(CompiledPattern {
                pattern: pattern.to_lowercase(),
                matcher,
                category,
                priority: cat_kind.match_priority(),
            });
        }
        compiled.sort_by_key(|p| p.priority);

        for km in &known_merchants {
            if !kinds.contains_key(&km.category) {
                return Err(ImportError::Vocabulary(format!(
                    "known merchant '{}' references unknown category '{}'",
                    km.pattern, km.category
                )));
            }
        }

        Ok(Vocabulary {
            hub,
            categories,
            patterns: compiled,
            known_merchants,
        })
    }

    pub fn hub(&self) -> HubType {
        self.hub
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn category(&self, id: &CategoryId) -> Option<&Category> {
        self.categories.iter().find(|c| &c.id == id)
    }

    pub fn known_merchants(&self) -> &[KnownMerchant] {
        &self.known_merchants
    }

    /// First pattern that matches wins, with income and transfer patterns
    /// consulted before expense ones.
    pub fn match_category(&self, description: &str) -> Option<&CategoryId> {
        let lowered = description.to_lowercase();
        self.patterns
            .iter()
            .find(|p| p.matches(&lowered, description))
            .map(|p| &p.category)
    }
}

// ── TOML schema ───────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct VocabularyFile {
    hub: HubType,
    #[serde(default)]
    categories: Vec<CategoryEntry>,
    #[serde(default)]
    patterns: Vec<PatternEntry>,
    #[serde(default)]
    known_merchants: Vec<KnownMerchantEntry>,
}

#[derive(Debug, Deserialize)]
struct CategoryEntry {
    id: String,
    name: String,
    kind: CategoryKind,
}

#[derive(Debug, Deserialize)]
struct PatternEntry {
    pattern: String,
    category: String,
    #[serde(default, rename = "match")]
    match_kind: MatchKind,
}

#[derive(Debug, Deserialize)]
struct KnownMerchantEntry {
    pattern: String,
    name: String,
    category: String,
    typical_amount: Option<String>,
}

// ── Builtin vocabularies ──────────────────────────────────────────────────────

fn build_builtin(hub: HubType) -> Result<Vocabulary, ImportError> {
    let (cats, pats, known) = match hub {
        HubType::Personal => (PERSONAL_CATEGORIES, PERSONAL_PATTERNS, PERSONAL_KNOWN),
        HubType::Business => (BUSINESS_CATEGORIES, BUSINESS_PATTERNS, BUSINESS_KNOWN),
    };
    let categories = cats
        .iter()
        .map(|(id, name, kind)| Category::new(id, name, *kind))
        .collect();
    let patterns = pats
        .iter()
        .map(|(pattern, kind, category)| {
            (pattern.to_string(), *kind, CategoryId::new(*category))
        })
        .collect();
    let known_merchants = known
        .iter()
        .map(|(pattern, name, category, typical_cents)| KnownMerchant {
            pattern: pattern.to_string(),
            display_name: name.to_string(),
            category: CategoryId::new(*category),
            typical_amount: typical_cents.map(Money::from_cents),
        })
        .collect();
    Vocabulary::assemble(hub, categories, patterns, known_merchants)
}

const PERSONAL_CATEGORIES: &[(&str, &str, CategoryKind)] = &[
    ("income", "Income", CategoryKind::Income),
    ("transfers", "Transfers", CategoryKind::Transfer),
    ("housing", "Housing & Rent", CategoryKind::Expense),
    ("utilities", "Utilities", CategoryKind::Expense),
    ("groceries", "Groceries", CategoryKind::Expense),
    ("dining", "Dining & Takeout", CategoryKind::Expense),
    ("transport", "Transport & Fuel", CategoryKind::Expense),
    ("subscriptions", "Subscriptions", CategoryKind::Expense),
    ("entertainment", "Entertainment", CategoryKind::Expense),
    ("health", "Health & Pharmacy", CategoryKind::Expense),
    ("insurance", "Insurance", CategoryKind::Expense),
    ("shopping", "Shopping", CategoryKind::Expense),
    ("travel", "Travel", CategoryKind::Expense),
    ("fees", "Bank Fees", CategoryKind::Expense),
];

const PERSONAL_PATTERNS: &[(&str, MatchKind, &str)] = &[
    ("payroll", MatchKind::Contains, "income"),
    ("salary", MatchKind::Contains, "income"),
    ("paycheck", MatchKind::Contains, "income"),
    (r"(?i)direct ?dep", MatchKind::Regex, "income"),
    ("interest paid", MatchKind::Contains, "income"),
    ("dividend", MatchKind::Contains, "income"),
    ("transfer", MatchKind::Contains, "transfers"),
    ("zelle", MatchKind::Contains, "transfers"),
    ("venmo", MatchKind::Contains, "transfers"),
    ("atm withdrawal", MatchKind::Contains, "transfers"),
    ("netflix", MatchKind::Contains, "subscriptions"),
    ("spotify", MatchKind::Contains, "subscriptions"),
    ("hulu", MatchKind::Contains, "subscriptions"),
    ("disney", MatchKind::Contains, "subscriptions"),
    ("hbo max", MatchKind::Contains, "subscriptions"),
    ("youtube premium", MatchKind::Contains, "subscriptions"),
    ("apple.com/bill", MatchKind::Contains, "subscriptions"),
    ("audible", MatchKind::Contains, "subscriptions"),
    ("patreon", MatchKind::Contains, "subscriptions"),
    ("planet fitness", MatchKind::Contains, "subscriptions"),
    ("uber eats", MatchKind::Contains, "dining"),
    ("doordash", MatchKind::Contains, "dining"),
    ("grubhub", MatchKind::Contains, "dining"),
    ("starbucks", MatchKind::Contains, "dining"),
    ("mcdonald", MatchKind::Contains, "dining"),
    ("chipotle", MatchKind::Contains, "dining"),
    ("dunkin", MatchKind::Contains, "dining"),
    ("restaurant", MatchKind::Contains, "dining"),
    ("cafe", MatchKind::Contains, "dining"),
    ("pizza", MatchKind::Contains, "dining"),
    ("whole foods", MatchKind::Contains, "groceries"),
    ("trader joe", MatchKind::Contains, "groceries"),
    ("safeway", MatchKind::Contains, "groceries"),
    ("kroger", MatchKind::Contains, "groceries"),
    ("aldi", MatchKind::Contains, "groceries"),
    ("costco", MatchKind::Contains, "groceries"),
    ("grocery", MatchKind::Contains, "groceries"),
    ("rent-a-car", MatchKind::Contains, "transport"),
    ("hertz", MatchKind::Contains, "transport"),
    ("avis", MatchKind::Contains, "transport"),
    ("uber", MatchKind::Contains, "transport"),
    ("lyft", MatchKind::Contains, "transport"),
    ("shell", MatchKind::Contains, "transport"),
    ("chevron", MatchKind::Contains, "transport"),
    ("exxon", MatchKind::Contains, "transport"),
    ("fuel", MatchKind::Contains, "transport"),
    ("parking", MatchKind::Contains, "transport"),
    ("transit", MatchKind::Contains, "transport"),
    ("mortgage", MatchKind::Contains, "housing"),
    ("rent", MatchKind::Contains, "housing"),
    ("hoa dues", MatchKind::Contains, "housing"),
    ("xfinity", MatchKind::Contains, "utilities"),
    ("comcast", MatchKind::Contains, "utilities"),
    ("verizon", MatchKind::Contains, "utilities"),
    ("t-mobile", MatchKind::Contains, "utilities"),
    ("at&t", MatchKind::Contains, "utilities"),
    ("electric", MatchKind::Contains, "utilities"),
    ("water bill", MatchKind::Contains, "utilities"),
    ("internet", MatchKind::Contains, "utilities"),
    ("cvs", MatchKind::Contains, "health"),
    ("walgreens", MatchKind::Contains, "health"),
    ("pharmacy", MatchKind::Contains, "health"),
    ("dental", MatchKind::Contains, "health"),
    ("clinic", MatchKind::Contains, "health"),
    ("geico", MatchKind::Contains, "insurance"),
    ("state farm", MatchKind::Contains, "insurance"),
    ("allstate", MatchKind::Contains, "insurance"),
    ("progressive", MatchKind::Contains, "insurance"),
    ("insurance", MatchKind::Contains, "insurance"),
    ("steam", MatchKind::Contains, "entertainment"),
    ("playstation", MatchKind::Contains, "entertainment"),
    ("nintendo", MatchKind::Contains, "entertainment"),
    ("cinema", MatchKind::Contains, "entertainment"),
    ("ticketmaster", MatchKind::Contains, "entertainment"),
    (r"(?i)^(amzn|amazon)", MatchKind::Regex, "shopping"),
    ("target", MatchKind::Contains, "shopping"),
    ("walmart", MatchKind::Contains, "shopping"),
    ("best buy", MatchKind::Contains, "shopping"),
    ("ebay", MatchKind::Contains, "shopping"),
    ("etsy", MatchKind::Contains, "shopping"),
    ("airbnb", MatchKind::Contains, "travel"),
    ("delta air", MatchKind::Contains, "travel"),
    ("united air", MatchKind::Contains, "travel"),
    ("southwest", MatchKind::Contains, "travel"),
    ("marriott", MatchKind::Contains, "travel"),
    ("hilton", MatchKind::Contains, "travel"),
    ("hotel", MatchKind::Contains, "travel"),
    ("expedia", MatchKind::Contains, "travel"),
    // \b keeps "coffee" out of the fees bucket.
    (r"(?i)\bfee\b", MatchKind::Regex, "fees"),
    ("overdraft", MatchKind::Contains, "fees"),
    ("interest charge", MatchKind::Contains, "fees"),
];

const PERSONAL_KNOWN: &[(&str, &str, &str, Option<i64>)] = &[
    ("netflix", "Netflix", "subscriptions", Some(1599)),
    ("spotify", "Spotify", "subscriptions", Some(1199)),
    ("hulu", "Hulu", "subscriptions", Some(1799)),
    ("disney", "Disney+", "subscriptions", Some(1399)),
    ("apple.com/bill", "Apple Services", "subscriptions", Some(999)),
    ("audible", "Audible", "subscriptions", Some(1495)),
    ("youtube premium", "YouTube Premium", "subscriptions", Some(1399)),
    ("planet fitness", "Planet Fitness", "subscriptions", Some(2499)),
    ("amazon prime", "Amazon Prime", "subscriptions", Some(1499)),
    ("xfinity", "Xfinity", "utilities", None),
    ("comcast", "Comcast", "utilities", None),
    ("verizon", "Verizon", "utilities", None),
    ("t-mobile", "T-Mobile", "utilities", None),
    ("geico", "GEICO", "insurance", None),
    ("state farm", "State Farm", "insurance", None),
];

const BUSINESS_CATEGORIES: &[(&str, &str, CategoryKind)] = &[
    ("revenue", "Services Revenue", CategoryKind::Income),
    ("transfers", "Owner Transfers", CategoryKind::Transfer),
    ("payroll", "Payroll", CategoryKind::Expense),
    ("software", "Software & Subscriptions", CategoryKind::Expense),
    ("hosting", "Hosting & Cloud", CategoryKind::Expense),
    ("marketing", "Advertising & Marketing", CategoryKind::Expense),
    ("office", "Office Supplies", CategoryKind::Expense),
    ("meals", "Business Meals", CategoryKind::Expense),
    ("travel", "Travel", CategoryKind::Expense),
    ("insurance", "Insurance", CategoryKind::Expense),
    ("professional", "Legal & Professional", CategoryKind::Expense),
    ("comms", "Internet & Phone", CategoryKind::Expense),
    ("rent", "Rent & Lease", CategoryKind::Expense),
    ("fees", "Bank Fees", CategoryKind::Expense),
];

const BUSINESS_PATTERNS: &[(&str, MatchKind, &str)] = &[
    ("payout", MatchKind::Contains, "revenue"),
    ("invoice", MatchKind::Contains, "revenue"),
    ("client payment", MatchKind::Contains, "revenue"),
    ("square inc", MatchKind::Contains, "revenue"),
    ("owner draw", MatchKind::Contains, "transfers"),
    ("owners draw", MatchKind::Contains, "transfers"),
    ("transfer", MatchKind::Contains, "transfers"),
    ("gusto", MatchKind::Contains, "payroll"),
    ("paychex", MatchKind::Contains, "payroll"),
    ("payroll", MatchKind::Contains, "payroll"),
    ("github", MatchKind::Contains, "software"),
    ("google workspace", MatchKind::Contains, "software"),
    ("gsuite", MatchKind::Contains, "software"),
    ("adobe", MatchKind::Contains, "software"),
    ("slack", MatchKind::Contains, "software"),
    ("zoom.us", MatchKind::Contains, "software"),
    ("notion", MatchKind::Contains, "software"),
    ("figma", MatchKind::Contains, "software"),
    ("atlassian", MatchKind::Contains, "software"),
    ("dropbox", MatchKind::Contains, "software"),
    ("1password", MatchKind::Contains, "software"),
    ("amazon web services", MatchKind::Contains, "hosting"),
    // Word-bounded: plain "aws" as a substring would catch "LAWSON".
    (r"(?i)\baws\b", MatchKind::Regex, "hosting"),
    ("digitalocean", MatchKind::Contains, "hosting"),
    ("google cloud", MatchKind::Contains, "hosting"),
    ("heroku", MatchKind::Contains, "hosting"),
    ("netlify", MatchKind::Contains, "hosting"),
    ("vercel", MatchKind::Contains, "hosting"),
    ("cloudflare", MatchKind::Contains, "hosting"),
    ("linode", MatchKind::Contains, "hosting"),
    ("google ads", MatchKind::Contains, "marketing"),
    ("facebook ads", MatchKind::Contains, "marketing"),
    ("meta platforms", MatchKind::Contains, "marketing"),
    ("mailchimp", MatchKind::Contains, "marketing"),
    ("linkedin", MatchKind::Contains, "marketing"),
    ("staples", MatchKind::Contains, "office"),
    ("office depot", MatchKind::Contains, "office"),
    ("uline", MatchKind::Contains, "office"),
    (r"(?i)^(amzn|amazon)", MatchKind::Regex, "office"),
    ("doordash", MatchKind::Contains, "meals"),
    ("restaurant", MatchKind::Contains, "meals"),
    ("catering", MatchKind::Contains, "meals"),
    ("coffee", MatchKind::Contains, "meals"),
    ("united air", MatchKind::Contains, "travel"),
    ("delta air", MatchKind::Contains, "travel"),
    ("airbnb", MatchKind::Contains, "travel"),
    ("hotel", MatchKind::Contains, "travel"),
    ("hertz", MatchKind::Contains, "travel"),
    ("lyft", MatchKind::Contains, "travel"),
    ("uber", MatchKind::Contains, "travel"),
    ("hiscox", MatchKind::Contains, "insurance"),
    ("insurance", MatchKind::Contains, "insurance"),
    ("legal", MatchKind::Contains, "professional"),
    (" llp", MatchKind::Contains, "professional"),
    ("accounting", MatchKind::Contains, "professional"),
    ("comcast business", MatchKind::Contains, "comms"),
    ("verizon", MatchKind::Contains, "comms"),
    ("ringcentral", MatchKind::Contains, "comms"),
    ("wework", MatchKind::Contains, "rent"),
    ("regus", MatchKind::Contains, "rent"),
    ("rent", MatchKind::Contains, "rent"),
    ("stripe fee", MatchKind::Contains, "fees"),
    ("wire fee", MatchKind::Contains, "fees"),
    ("service charge", MatchKind::Contains, "fees"),
    ("overdraft", MatchKind::Contains, "fees"),
    (r"(?i)\bfee\b", MatchKind::Regex, "fees"),
];

const BUSINESS_KNOWN: &[(&str, &str, &str, Option<i64>)] = &[
    ("gusto", "Gusto", "payroll", None),
    ("github", "GitHub", "software", Some(400)),
    ("google workspace", "Google Workspace", "software", Some(1440)),
    ("adobe", "Adobe Creative Cloud", "software", Some(5999)),
    ("slack", "Slack", "software", Some(875)),
    ("zoom.us", "Zoom", "software", Some(1599)),
    ("amazon web", "Amazon Web Services", "hosting", None),
    ("digitalocean", "DigitalOcean", "hosting", Some(1200)),
    ("mailchimp", "Mailchimp", "marketing", Some(1300)),
    ("ringcentral", "RingCentral", "comms", Some(2999)),
    ("wework", "WeWork", "rent", None),
];

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> CategoryId {
        CategoryId::new(s)
    }

    // ── builtin tables ────────────────────────────────────────────────────────

    #[test]
    fn builtin_personal_maps_streaming_to_subscriptions() {
        let vocab = Vocabulary::builtin(HubType::Personal);
        assert_eq!(
            vocab.match_category("NETFLIX.COM 866-579-7172"),
            Some(&id("subscriptions"))
        );
    }

    #[test]
    fn builtin_is_shared() {
        let a = Vocabulary::builtin(HubType::Personal);
        let b = Vocabulary::builtin(HubType::Personal);
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn income_patterns_beat_expense_patterns() {
        // "transfer" (transfer kind) appears in the description, but the
        // payroll pattern belongs to an income category and is tried first.
        let vocab = Vocabulary::builtin(HubType::Personal);
        assert_eq!(
            vocab.match_category("PAYROLL TRANSFER ACME CORP"),
            Some(&id("income"))
        );
    }

    #[test]
    fn word_bounded_fee_skips_coffee() {
        let vocab = Vocabulary::builtin(HubType::Business);
        assert_eq!(vocab.match_category("BLUE BOTTLE COFFEE"), Some(&id("meals")));
        assert_eq!(
            vocab.match_category("MONTHLY MAINTENANCE FEE"),
            Some(&id("fees"))
        );
    }

    #[test]
    fn aws_is_word_bounded() {
        let vocab = Vocabulary::builtin(HubType::Business);
        assert_eq!(vocab.match_category("AWS BILLING"), Some(&id("hosting")));
        assert_ne!(vocab.match_category("LAWSON STORE 52"), Some(&id("hosting")));
    }

    #[test]
    fn unknown_description_matches_nothing() {
        let vocab = Vocabulary::builtin(HubType::Personal);
        assert_eq!(vocab.match_category("QUANTUM FLOWERS LLC"), None);
    }

    #[test]
    fn builtin_known_merchants_reference_real_categories() {
        for hub in [HubType::Personal, HubType::Business] {
            let vocab = Vocabulary::builtin(hub);
            for km in vocab.known_merchants() {
                assert!(
                    vocab.category(&km.category).is_some(),
                    "{} points at missing category {}",
                    km.pattern,
                    km.category
                );
            }
        }
    }

    // ── TOML loading ──────────────────────────────────────────────────────────

    const SAMPLE: &str = r#"
hub = "personal"

[[categories]]
id = "coffee"
name = "Coffee"
kind = "expense"

[[categories]]
id = "wages"
name = "Wages"
kind = "income"

[[patterns]]
pattern = "blue bottle"
category = "coffee"

[[patterns]]
pattern = '(?i)\bpayday\b'
category = "wages"
match = "regex"

[[known_merchants]]
pattern = "blue bottle"
name = "Blue Bottle"
category = "coffee"
typical_amount = "6.50"
"#;

    #[test]
    fn from_toml_builds_a_working_vocabulary() {
        let vocab = Vocabulary::from_toml(SAMPLE).unwrap();
        assert_eq!(vocab.hub(), HubType::Personal);
        assert_eq!(vocab.match_category("BLUE BOTTLE OAKLAND"), Some(&id("coffee")));
        assert_eq!(vocab.match_category("ACME PAYDAY"), Some(&id("wages")));
        let km = &vocab.known_merchants()[0];
        assert_eq!(km.display_name, "Blue Bottle");
        assert_eq!(km.typical_amount, Some(Money::from_cents(650)));
    }

    #[test]
    fn from_toml_orders_income_before_expense() {
        // Declared after "blue bottle" but still tried first.
        let vocab = Vocabulary::from_toml(SAMPLE).unwrap();
        assert_eq!(
            vocab.match_category("BLUE BOTTLE PAYDAY"),
            Some(&id("wages"))
        );
    }

    #[test]
    fn from_toml_rejects_unknown_category_reference() {
        let text = r#"
hub = "personal"

[[patterns]]
pattern = "x"
category = "nope"
"#;
        assert!(matches!(
            Vocabulary::from_toml(text),
            Err(ImportError::Vocabulary(_))
        ));
    }

    #[test]
    fn from_toml_rejects_duplicate_category_ids() {
        let text = r#"
hub = "business"

[[categories]]
id = "a"
name = "A"
kind = "expense"

[[categories]]
id = "a"
name = "A again"
kind = "expense"
"#;
        assert!(matches!(
            Vocabulary::from_toml(text),
            Err(ImportError::Vocabulary(_))
        ));
    }

    #[test]
    fn from_toml_rejects_bad_regex() {
        let text = r#"
hub = "personal"

[[categories]]
id = "a"
name = "A"
kind = "expense"

[[patterns]]
pattern = "(unclosed"
category = "a"
match = "regex"
"#;
        assert!(matches!(
            Vocabulary::from_toml(text),
            Err(ImportError::Vocabulary(_))
        ));
    }

    #[test]
    fn match_kind_from_str() {
        assert_eq!("contains".parse::<MatchKind>().unwrap(), MatchKind::Contains);
        assert_eq!("Regex".parse::<MatchKind>().unwrap(), MatchKind::Regex);
        assert!("fuzzy".parse::<MatchKind>().is_err());
    }
}
