use std::mem;

use tracing::debug;

use super::{encode_block, Encoder, EncoderState, ID_ENTRY_SIZE, TAG_PAIR_SIZE};
use crate::data::{
    coords::DeltaEncoder,
    relation::Relation,
    strings::{signed_index, StringTable},
    tags::encode_tags,
    PbfPrimitiveGroup,
};
use crate::error::Result;
use crate::proto::osmformat::Relation as PbfRelation;

/// Role index, delta coded member id and member type of one member.
const MEMBER_ENTRY_SIZE: usize = 13;

#[derive(Debug, Default)]
pub struct RelationEncoder {
    strings: StringTable,
    relations: Vec<PbfRelation>,
    members_size: usize,
    tags_size: usize,
    state: EncoderState,
}

impl RelationEncoder {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn state(&self) -> EncoderState {
        self.state
    }
}

impl Encoder for RelationEncoder {
    type Entity = Relation;

    fn add(&mut self, relation: &Relation) -> Result<()> {
        self.state.ensure_open()?;
        let members = relation.members();
        let mut last = DeltaEncoder::default();
        let memids = members
            .iter()
            .map(|m| last.encode(m.id))
            .collect::<Result<Vec<i64>>>()?;
        let types = members.iter().map(|m| m.member_type.code()).collect();
        let roles_sid = members
            .iter()
            .map(|m| match m.role.as_str() {
                // absent role
                "" => Ok(0),
                role => signed_index(self.strings.intern(role)),
            })
            .collect::<Result<Vec<i32>>>()?;
        let (keys, vals) = encode_tags(&mut self.strings, relation.tags());

        self.members_size += members.len() * MEMBER_ENTRY_SIZE;
        self.tags_size += keys.len() * TAG_PAIR_SIZE;
        self.relations.push(PbfRelation {
            id: relation.id().0,
            keys,
            vals,
            info: None,
            roles_sid,
            memids,
            types,
        });
        Ok(())
    }

    #[inline]
    fn estimate_size(&self) -> usize {
        self.strings.estimated_byte_size()
            + self.relations.len() * ID_ENTRY_SIZE
            + self.members_size
            + self.tags_size
    }

    #[inline]
    fn len(&self) -> usize {
        self.relations.len()
    }

    fn write(&mut self) -> Result<Vec<u8>> {
        self.state.finish()?;
        let strings = mem::take(&mut self.strings);
        let relations = mem::take(&mut self.relations);
        debug!(
            relations = relations.len(),
            strings = strings.len(),
            "writing relations block"
        );
        let group = PbfPrimitiveGroup {
            relations,
            ..Default::default()
        };
        Ok(encode_block(strings, group, None))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::relation::{MemberType, RelationMember};
    use crate::error::Error;

    #[test]
    fn members_are_delta_coded() {
        let mut encoder = RelationEncoder::new();
        let relation = Relation::new(
            5,
            vec![
                RelationMember::new(MemberType::Way, 20, "outer"),
                RelationMember::new(MemberType::Way, 15, "inner"),
                RelationMember::new(MemberType::Relation, 7, ""),
            ],
        );
        encoder.add(&relation).unwrap();
        encoder.add(&Relation::new(6, vec![RelationMember::new(MemberType::Node, 3, "")])).unwrap();

        let first = &encoder.relations[0];
        assert_eq!(first.memids, [20, -5, -8]);
        assert_eq!(first.types, [1, 1, 2]);
        assert_eq!(first.roles_sid, [1, 2, 0]);
        assert_eq!(encoder.relations[1].memids, [3]);
        assert_eq!(encoder.relations[1].roles_sid, [0]);
        assert_eq!(encoder.strings.len(), 2);
    }

    #[test]
    fn size_estimate() {
        let mut encoder = RelationEncoder::new();
        let relation = Relation::new(1, vec![RelationMember::new(MemberType::Node, 1, "via")])
            .with_tag("type", "restriction");
        encoder.add(&relation).unwrap();
        // "via" + "type" + "restriction", one id, one member, one tag
        assert_eq!(encoder.estimate_size(), 18 + 8 + 13 + 8);
    }

    #[test]
    fn add_after_write_fails() {
        let mut encoder = RelationEncoder::new();
        encoder.add(&Relation::new(1, vec![])).unwrap();
        let written = encoder.write().unwrap();
        assert!(matches!(
            encoder.add(&Relation::new(2, vec![])),
            Err(Error::InvalidState(_))
        ));
        assert!(!written.is_empty());
    }
}
