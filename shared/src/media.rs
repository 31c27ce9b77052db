use serde::{Deserialize, Serialize};

/// One entry of the media catalog, as listed to clients.
///
/// `file` and `thumbnail` are references relative to the server's media
/// mounts (`/vids`, `/images`, `/thumbnails`), never filesystem paths.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct MediaEntry {
    pub title: String,
    pub file: String,
    pub thumbnail: String,
}
