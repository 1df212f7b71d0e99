use crate::domain::{MemberUid, ProjectCode};

const PORTAL_ENDPOINT: &str = "https://jvo.nao.ac.jp/portal/alma/archive.do";
const DATA_PORTAL_ENDPOINT: &str = "https://almascience.nrao.edu/dataPortal/";

pub const DEFAULT_PAGE_LIMIT: u32 = 20;

/// Project results page listing, ordered as the portal renders it.
pub fn listing_url(project: &ProjectCode, limit: u32, offset: u32) -> String {
    format!(
        "{PORTAL_ENDPOINT}?action=project.info&projectCode={}&orderBy=&order=&limit={limit}&offset={offset}",
        project.as_str()
    )
}

/// Quicklook thumbnail for a source. Deterministic; the portal decides
/// whether the image actually exists.
pub fn thumbnail_url(source_name: &str) -> String {
    format!(
        "{PORTAL_ENDPOINT}?pictSize=128&dataId={source_name}_00_00_00&dataType=image&action=quicklook"
    )
}

/// Raw data file on the ALMA data portal. The uid is already
/// `member`-normalized by construction.
pub fn file_url(uid: &MemberUid) -> String {
    format!("{DATA_PORTAL_ENDPOINT}{}", uid.as_str())
}
