use crate::proto::osmformat::ChangeSet as PbfChangeSet;

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ChangeSetId(pub i64);

impl ChangeSetId {
    #[inline]
    pub(crate) fn from_pbf(c: &PbfChangeSet) -> Self {
        ChangeSetId(c.id)
    }
}
