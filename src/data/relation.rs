use crate::error::{Error, Result};
use crate::proto::osmformat::Relation as PbfRelation;

use super::{
    coords::DeltaDecoder,
    info::Info,
    strings::table_index,
    tags::{decode_tags, Tags},
    PrimitiveBlock,
};

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RelationId(pub i64);

/// Kind of primitive a relation member refers to.
///
/// The numeric codes are the ones of `Relation.MemberType` in
/// `osmformat.proto` and must not change.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum MemberType {
    Node,
    Way,
    Relation,
}

impl MemberType {
    #[inline]
    pub const fn code(self) -> i32 {
        match self {
            Self::Node => 0,
            Self::Way => 1,
            Self::Relation => 2,
        }
    }
}

impl TryFrom<i32> for MemberType {
    type Error = Error;

    #[inline]
    fn try_from(code: i32) -> Result<Self> {
        Ok(match code {
            0 => Self::Node,
            1 => Self::Way,
            2 => Self::Relation,
            _ => return Err(Error::UnknownMemberType(code)),
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RelationMember {
    pub id: i64,
    /// Empty when the member has no role.
    pub role: String,
    pub member_type: MemberType,
}

impl RelationMember {
    #[inline]
    pub fn new(member_type: MemberType, id: i64, role: impl Into<String>) -> Self {
        Self {
            id,
            role: role.into(),
            member_type,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Relation {
    id: RelationId,
    tags: Tags,
    members: Vec<RelationMember>,
    info: Option<Info>,
}

impl Relation {
    #[inline]
    pub fn new(id: i64, members: Vec<RelationMember>) -> Self {
        Self {
            id: RelationId(id),
            tags: Tags::new(),
            members,
            info: None,
        }
    }

    #[inline]
    pub fn with_tags(mut self, tags: Tags) -> Self {
        self.tags = tags;
        self
    }

    #[inline]
    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    #[inline(always)]
    pub fn id(&self) -> RelationId {
        self.id
    }

    #[inline(always)]
    pub fn tags(&self) -> &Tags {
        &self.tags
    }

    #[inline(always)]
    pub fn members(&self) -> &[RelationMember] {
        &self.members
    }

    #[inline(always)]
    pub fn info(&self) -> Option<&Info> {
        self.info.as_ref()
    }
}

impl PrimitiveBlock {
    pub(crate) fn decode_relation(&self, r: &PbfRelation) -> Result<Relation> {
        let len = r.memids.len();
        if r.roles_sid.len() != len || r.types.len() != len {
            return Err(Error::MalformedBlock("relation member columns differ in length"));
        }
        let mut last = DeltaDecoder::default();
        let mut members = Vec::with_capacity(len);
        for ((&role, &delta), &code) in r.roles_sid.iter().zip(&r.memids).zip(&r.types) {
            members.push(RelationMember {
                id: last.decode(delta)?,
                role: self.strings.resolve(table_index(role)?)?.to_owned(),
                member_type: MemberType::try_from(code)?,
            });
        }
        let info = r
            .info
            .as_ref()
            .map(|i| Info::from_pbf(i, &self.strings, self.date_granularity))
            .transpose()?;
        Ok(Relation {
            id: RelationId(r.id),
            tags: decode_tags(&self.strings, &r.keys, &r.vals)?,
            members,
            info,
        })
    }
}
