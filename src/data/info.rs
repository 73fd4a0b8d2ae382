use super::coords::DeltaDecoder;
use super::strings::{table_index, StringTable};
use crate::error::{Error, Result};
use crate::proto::osmformat::{DenseInfo as PbfDenseInfo, Info as PbfInfo};

/// Editing metadata of a primitive.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Info {
    /// `-1` when the block does not carry a version.
    pub version: i32,
    /// Milliseconds since the epoch.
    pub timestamp: Option<i64>,
    pub changeset: Option<i64>,
    pub uid: Option<i32>,
    pub user: Option<String>,
    pub visible: bool,
}

impl Default for Info {
    #[inline(always)]
    fn default() -> Self {
        Self {
            version: -1,
            timestamp: None,
            changeset: None,
            uid: None,
            user: None,
            visible: true,
        }
    }
}

impl Info {
    pub(crate) fn from_pbf(
        info: &PbfInfo,
        strings: &StringTable,
        date_granularity: i32,
    ) -> Result<Self> {
        let user = match info.user_sid {
            Some(sid) => Some(strings.resolve(sid as usize)?.to_owned()),
            None => None,
        };
        Ok(Self {
            version: info.version(),
            timestamp: info
                .timestamp
                .map(|t| t.saturating_mul(i64::from(date_granularity))),
            changeset: info.changeset,
            uid: info.uid,
            user,
            visible: info.visible.unwrap_or(true),
        })
    }
}

/// Delta state for the `DenseInfo` columns of one dense group.
///
/// `timestamp`, `changeset`, `uid` and `user_sid` are delta coded, `version`
/// and `visible` are not. Missing column entries fall back to defaults.
#[derive(Default)]
pub(crate) struct DenseInfoState {
    timestamp: DeltaDecoder,
    changeset: DeltaDecoder,
    uid: DeltaDecoder,
    user_sid: DeltaDecoder,
}

impl DenseInfoState {
    pub(crate) fn next(
        &mut self,
        info: &PbfDenseInfo,
        pos: usize,
        strings: &StringTable,
        date_granularity: i32,
    ) -> Result<Info> {
        let timestamp = match info.timestamp.get(pos) {
            Some(&delta) => Some(
                self.timestamp
                    .decode(delta)?
                    .saturating_mul(i64::from(date_granularity)),
            ),
            None => None,
        };
        let changeset = match info.changeset.get(pos) {
            Some(&delta) => Some(self.changeset.decode(delta)?),
            None => None,
        };
        let uid = match info.uid.get(pos) {
            Some(&delta) => {
                let uid = self.uid.decode(i64::from(delta))?;
                Some(i32::try_from(uid).map_err(|_| Error::DeltaOverflow)?)
            }
            None => None,
        };
        let user = match info.user_sid.get(pos) {
            Some(&delta) => {
                let sid = self.user_sid.decode(i64::from(delta))?;
                let sid = table_index(i32::try_from(sid).map_err(|_| Error::DeltaOverflow)?)?;
                Some(strings.resolve(sid)?.to_owned())
            }
            None => None,
        };
        Ok(Info {
            version: info.version.get(pos).copied().unwrap_or(-1),
            timestamp,
            changeset,
            uid,
            user,
            visible: info.visible.get(pos).copied().unwrap_or(true),
        })
    }
}
