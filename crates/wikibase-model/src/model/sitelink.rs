//! Site links: an item's pages on external sites.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::ModelError;
use crate::limits::MAX_SITE_LINK_LEN;
use crate::model::ItemId;

/// A link from an item to a page on a site, with optional badges.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SiteLink {
    site_id: String,
    page_name: String,
    badges: BTreeSet<ItemId>,
}

impl SiteLink {
    pub fn new(site_id: impl Into<String>, page_name: impl Into<String>) -> Result<Self, ModelError> {
        Self::with_badges(site_id, page_name, [])
    }

    pub fn with_badges(
        site_id: impl Into<String>,
        page_name: impl Into<String>,
        badges: impl IntoIterator<Item = ItemId>,
    ) -> Result<Self, ModelError> {
        let site_id = site_id.into();
        let page_name = page_name.into();
        for (field, value) in [("site id", &site_id), ("page name", &page_name)] {
            if value.len() > MAX_SITE_LINK_LEN {
                return Err(ModelError::LengthExceedsLimit {
                    field,
                    len: value.len(),
                    max: MAX_SITE_LINK_LEN,
                });
            }
        }
        Ok(Self {
            site_id,
            page_name,
            badges: badges.into_iter().collect(),
        })
    }

    pub fn site_id(&self) -> &str {
        &self.site_id
    }

    pub fn page_name(&self) -> &str {
        &self.page_name
    }

    /// Badges, sorted by id.
    pub fn badges(&self) -> &BTreeSet<ItemId> {
        &self.badges
    }
}

/// Site links keyed by site id, at most one per site.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SiteLinkList {
    links: BTreeMap<String, SiteLink>,
}

impl SiteLinkList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a link, rejecting a second link for the same site.
    pub fn add(&mut self, link: SiteLink) -> Result<(), ModelError> {
        if self.links.contains_key(link.site_id()) {
            return Err(ModelError::DuplicateSiteLink {
                site_id: link.site_id().to_string(),
            });
        }
        self.links.insert(link.site_id.clone(), link);
        Ok(())
    }

    /// Adds or replaces the link for the link's site, returning the old one.
    pub fn set(&mut self, link: SiteLink) -> Option<SiteLink> {
        self.links.insert(link.site_id.clone(), link)
    }

    pub fn get(&self, site_id: &str) -> Option<&SiteLink> {
        self.links.get(site_id)
    }

    pub fn has(&self, site_id: &str) -> bool {
        self.links.contains_key(site_id)
    }

    pub fn remove(&mut self, site_id: &str) -> Option<SiteLink> {
        self.links.remove(site_id)
    }

    /// Iterates links sorted by site id.
    pub fn iter(&self) -> impl Iterator<Item = &SiteLink> {
        self.links.values()
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub fn clear(&mut self) {
        self.links.clear();
    }

    pub(crate) fn as_map(&self) -> &BTreeMap<String, SiteLink> {
        &self.links
    }
}
