use crate::model::Resource;
use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub enum Selector {
    #[default]
    All,
    Exact(String),
}

impl Selector {
    pub fn from_choice(choice: &str) -> Self {
        let choice = choice.trim();
        if choice.is_empty() || choice.eq_ignore_ascii_case("all") {
            Self::All
        } else {
            Self::Exact(choice.to_string())
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Self::All)
    }

    pub fn matches(&self, value: Option<&str>) -> bool {
        match self {
            Self::All => true,
            Self::Exact(expected) => value == Some(expected.as_str()),
        }
    }

    pub fn cycle(&self, options: &[String]) -> Self {
        let next_index = match self {
            Self::All => 0,
            Self::Exact(current) => options
                .iter()
                .position(|option| option == current)
                .map(|index| index + 1)
                .unwrap_or(0),
        };

        options
            .get(next_index)
            .map(|option| Self::Exact(option.clone()))
            .unwrap_or(Self::All)
    }
}

impl Display for Selector {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::All => write!(f, "all"),
            Self::Exact(value) => write!(f, "{value}"),
        }
    }
}

#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct FilterState {
    pub search: String,
    pub namespace: Selector,
    pub category: Selector,
}

impl FilterState {
    pub fn is_inactive(&self) -> bool {
        self.search.trim().is_empty() && self.namespace.is_all() && self.category.is_all()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn matches<R: Resource>(&self, record: &R) -> bool {
        self.matches_search(record)
            && self.namespace.matches(record.namespace())
            && self.category.matches(record.category())
    }

    fn matches_search<R: Resource>(&self, record: &R) -> bool {
        let query = self.search.trim();
        if query.is_empty() {
            return true;
        }

        let query = query.to_lowercase();
        record
            .search_fields()
            .into_iter()
            .any(|field| field.to_lowercase().contains(&query))
    }
}

pub fn apply<'a, R, I>(records: I, filter: &FilterState) -> Vec<&'a R>
where
    R: Resource + 'a,
    I: IntoIterator<Item = &'a R>,
{
    records
        .into_iter()
        .filter(|record| filter.matches(*record))
        .collect()
}

pub fn category_options<R: Resource>(records: &[R]) -> Vec<String> {
    records
        .iter()
        .filter_map(|record| record.category())
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
