//! Provider adapters: Eastmoney (southbound flow), cninfo (announcement
//! search), Sina futures (primary commodity prices), and the local quote
//! board (secondary commodity prices).

mod cninfo;
mod eastmoney;
mod quote_board;
mod sina;
mod snapshots;

pub use cninfo::CninfoAnnouncementAdapter;
pub use eastmoney::EastmoneyFlowAdapter;
pub use quote_board::QuoteBoardAdapter;
pub use sina::SinaFuturesAdapter;
pub use snapshots::StaticSnapshots;
