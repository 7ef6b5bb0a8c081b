use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

/// Most recent first unless a caller asks otherwise.
impl Default for SortOrder {
    fn default() -> Self {
        SortOrder::Desc
    }
}

/// The normalized parameters governing one list fetch. Rebuilt from scratch
/// on every page/search/filter change and never persisted; the displayed set
/// is always re-derived from the gateway's response for the current
/// descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryDescriptor {
    pub page: u32,
    pub page_size: u32,
    pub search: String,
    pub sort_order: SortOrder,
    pub filter_status: String,
}

impl QueryDescriptor {
    /// Pure pass-through composition. `search` and `filter_status` go to the
    /// gateway verbatim, empty string included (empty means "no filter");
    /// interpretation is the gateway's concern.
    pub fn compose(
        page: u32,
        page_size: u32,
        search: impl Into<String>,
        sort_order: SortOrder,
        filter_status: impl Into<String>,
    ) -> Self {
        Self {
            page,
            page_size,
            search: search.into(),
            sort_order,
            filter_status: filter_status.into(),
        }
    }

    pub fn first_page(page_size: u32) -> Self {
        Self::compose(1, page_size, "", SortOrder::default(), "")
    }

    pub fn as_query_params(&self) -> Vec<(&'static str, String)> {
        vec![
            ("page", self.page.to_string()),
            ("page_size", self.page_size.to_string()),
            ("search", self.search.clone()),
            ("sort_order", self.sort_order.as_str().to_string()),
            ("filter_status", self.filter_status.clone()),
        ]
    }
}
