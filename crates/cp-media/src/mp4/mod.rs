//! ISO Base Media File Format (MP4/MOV/HEIC) structure parsing.

pub mod boxes;
pub mod info;

pub use boxes::{find_all, find_first, parse_boxes, parse_top_level, Mp4Box};
pub use info::{count_moov, extract_video_info, scan_for_moov, strip_duplicate_moov};
