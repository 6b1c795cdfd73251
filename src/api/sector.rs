use async_graphql::{Object, SimpleObject};

use crate::problem::Sector;

#[derive(SimpleObject)]
struct SectorInfo {
    sector: Sector,
    /// The display name of the sector.
    label: String,
    /// The subcategories a problem of this sector may be filed under.
    subcategories: Vec<String>,
}

impl From<Sector> for SectorInfo {
    fn from(sector: Sector) -> Self {
        Self {
            sector,
            label: sector.label().to_string(),
            subcategories: sector
                .subcategories()
                .iter()
                .map(ToString::to_string)
                .collect(),
        }
    }
}

#[derive(Default)]
pub(super) struct SectorQuery;

#[Object]
impl SectorQuery {
    /// The sector catalog, in display order.
    #[allow(clippy::unused_async)]
    async fn sectors(&self) -> Vec<SectorInfo> {
        Sector::ALL.into_iter().map(SectorInfo::from).collect()
    }
}
