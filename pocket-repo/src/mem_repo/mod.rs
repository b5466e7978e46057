use crate::analytics_repo::Window;
use crate::budget_repo::BudgetPeriod;
use crate::tag_repo::Tag;
use crate::transaction_repo::{Direction, TagRef, Transaction};
use crate::user_repo::{User, UserId};
use crate::{HealthCheck, Repos};
use anyhow::anyhow;
use async_trait::async_trait;
use chrono::{Local, NaiveDate, NaiveDateTime};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

mod analytics_repo;
mod budget_repo;
mod tag_repo;
mod transaction_repo;
mod user_repo;

/// Global tags every fresh store starts with, mirroring the SQL migration seed
const DEFAULT_TAGS: [(&str, &str, &str, Option<&str>); 8] = [
    ("Food", "food", "#F59E0B", Some("🍽️")),
    ("Transport", "transport", "#3B82F6", Some("🚗")),
    ("Shopping", "shopping", "#EC4899", Some("🛍️")),
    ("Entertainment", "entertainment", "#8B5CF6", Some("🎬")),
    ("Bills", "bills", "#6B7280", Some("💡")),
    ("Health", "health", "#EF4444", Some("⚕️")),
    ("Salary", "salary", "#10B981", Some("💰")),
    ("Other", "other", "#8B4513", None),
];

struct TransactionRecord {
    user_id: UserId,
    amount_minor: i64,
    currency: String,
    direction: Direction,
    occurred_at: NaiveDateTime,
    description: String,
    merchant: Option<String>,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

struct BudgetRecord {
    user_id: UserId,
    name: String,
    amount_minor: i64,
    period: BudgetPeriod,
    start_date: NaiveDate,
    end_date: NaiveDate,
    is_active: bool,
    created_at: NaiveDateTime,
}

struct BudgetCategoryRecord {
    budget_id: i32,
    tag_id: i32,
    amount_minor: i64,
}

struct State {
    users: HashMap<UserId, User>,
    tags: BTreeMap<i32, Tag>,
    transactions: HashMap<i32, TransactionRecord>,
    /// (transaction id, tag id)
    transaction_tags: BTreeSet<(i32, i32)>,
    budgets: HashMap<i32, BudgetRecord>,
    budget_categories: BTreeMap<i32, BudgetCategoryRecord>,
    next_user_id: UserId,
    next_tag_id: i32,
    next_transaction_id: i32,
    next_budget_id: i32,
    next_budget_category_id: i32,
}

impl State {
    fn new() -> State {
        let mut state = State {
            users: HashMap::new(),
            tags: BTreeMap::new(),
            transactions: HashMap::new(),
            transaction_tags: BTreeSet::new(),
            budgets: HashMap::new(),
            budget_categories: BTreeMap::new(),
            next_user_id: 1,
            next_tag_id: 1,
            next_transaction_id: 1,
            next_budget_id: 1,
            next_budget_category_id: 1,
        };

        let now = now();
        for (name, slug, color, icon) in DEFAULT_TAGS {
            let id = state.next_tag_id;
            state.next_tag_id += 1;
            state.tags.insert(
                id,
                Tag {
                    id,
                    user_id: None,
                    name: name.to_owned(),
                    slug: slug.to_owned(),
                    color: Some(color.to_owned()),
                    icon: icon.map(str::to_owned),
                    is_default: true,
                    archived_at: None,
                    created_at: now,
                },
            );
        }

        state
    }

    fn visible_tag(&self, user: UserId, tag_id: i32) -> Option<&Tag> {
        self.tags.get(&tag_id).filter(|t| t.is_visible_to(user))
    }

    /// Tags that can be attached to new transactions and budgets
    fn usable_tag(&self, user: UserId, tag_id: i32) -> Option<&Tag> {
        self.visible_tag(user, tag_id)
            .filter(|t| t.archived_at.is_none())
    }

    fn tag_refs(&self, transaction_id: i32) -> Vec<TagRef> {
        let mut tags: Vec<TagRef> = self
            .transaction_tags
            .range((transaction_id, i32::MIN)..=(transaction_id, i32::MAX))
            .filter_map(|(_, tag_id)| self.tags.get(tag_id))
            .map(|t| TagRef {
                id: t.id,
                name: t.name.clone(),
                color: t.color.clone(),
                icon: t.icon.clone(),
            })
            .collect();
        tags.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        tags
    }

    fn has_tag(&self, transaction_id: i32, tag_id: i32) -> bool {
        self.transaction_tags.contains(&(transaction_id, tag_id))
    }

    fn to_transaction(&self, id: i32, record: &TransactionRecord) -> Transaction {
        Transaction {
            id,
            amount_minor: record.amount_minor,
            currency: record.currency.clone(),
            direction: record.direction,
            occurred_at: record.occurred_at,
            description: record.description.clone(),
            merchant: record.merchant.clone(),
            created_at: record.created_at,
            updated_at: record.updated_at,
            tags: self.tag_refs(id),
        }
    }

    /// Sum of the user's expenses inside `window`, optionally only those tagged with `tag_id`
    fn expense_sum(&self, user: UserId, window: Window, tag_id: Option<i32>) -> i64 {
        self.transactions
            .iter()
            .filter(|(_, t)| t.user_id == user && t.direction == Direction::Expense)
            .filter(|(_, t)| window.contains(t.occurred_at))
            .filter(|(id, _)| tag_id.map_or(true, |tag_id| self.has_tag(**id, tag_id)))
            .map(|(_, t)| t.amount_minor)
            .sum()
    }
}

fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

/// Store kept entirely in memory. Used by tests and local experiments.
pub struct MemRepo {
    state: RwLock<State>,
}

impl MemRepo {
    pub fn new() -> MemRepo {
        MemRepo {
            state: RwLock::new(State::new()),
        }
    }

    fn read_lock(&self) -> Result<RwLockReadGuard<State>, anyhow::Error> {
        self.state
            .read()
            .map_err(|_| anyhow!("Unable to acquire lock"))
    }

    fn write_lock(&self) -> Result<RwLockWriteGuard<State>, anyhow::Error> {
        self.state
            .write()
            .map_err(|_| anyhow!("Unable to acquire lock"))
    }
}

impl Default for MemRepo {
    fn default() -> Self {
        MemRepo::new()
    }
}

#[async_trait]
impl HealthCheck for MemRepo {
    async fn check(&self) -> bool {
        self.read_lock().is_ok()
    }
}

pub fn create_repos() -> Repos {
    Repos::from_shared(Arc::new(MemRepo::new()))
}
