use rusqlite::{params, OptionalExtension, Row};
use tracing::info;

use crate::error::{Entity, StoreError, StoreResult};
use crate::input::MembershipFields;
use crate::models::{LineupEntry, Membership};

use super::Store;

fn membership_from_row(row: &Row<'_>) -> rusqlite::Result<Membership> {
    Ok(Membership {
        id: row.get(0)?,
        band_id: row.get(1)?,
        member_id: row.get(2)?,
        start_year: row.get(3)?,
        end_year: row.get(4)?,
        role: row.get(5)?,
    })
}

impl Store {
    pub fn get_membership(&self, id: i64) -> StoreResult<Membership> {
        self.conn
            .query_row(
                "SELECT membership_id, band_id, member_id, start_year, end_year, role
                 FROM memberships
                 WHERE membership_id = ?1",
                [id],
                membership_from_row,
            )
            .optional()?
            .ok_or_else(|| StoreError::not_found(Entity::Membership, id))
    }

    /// Place a member in a band. Both ids must already exist.
    pub fn create_membership(&self, fields: &MembershipFields) -> StoreResult<Membership> {
        fields.validate()?;
        self.check_membership_refs(fields)?;

        self.conn.execute(
            "INSERT INTO memberships (band_id, member_id, start_year, end_year, role)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                fields.band_id,
                fields.member_id,
                fields.start_year,
                fields.end_year,
                fields.role
            ],
        )?;

        let id = self.conn.last_insert_rowid();
        info!(
            membership_id = id,
            band_id = fields.band_id,
            member_id = fields.member_id,
            "created membership"
        );
        Ok(membership_with_id(id, fields))
    }

    /// Replace every mutable field of an existing membership.
    pub fn update_membership(
        &self,
        id: i64,
        fields: &MembershipFields,
    ) -> StoreResult<Membership> {
        if !self.row_exists("memberships", "membership_id", id)? {
            return Err(StoreError::not_found(Entity::Membership, id));
        }
        fields.validate()?;
        self.check_membership_refs(fields)?;

        self.conn.execute(
            "UPDATE memberships
             SET band_id = ?1, member_id = ?2, start_year = ?3, end_year = ?4, role = ?5
             WHERE membership_id = ?6",
            params![
                fields.band_id,
                fields.member_id,
                fields.start_year,
                fields.end_year,
                fields.role,
                id
            ],
        )?;

        info!(membership_id = id, "updated membership");
        Ok(membership_with_id(id, fields))
    }

    /// Remove a membership. Deleting an id that is already gone reports
    /// `NotFound`.
    pub fn delete_membership(&self, id: i64) -> StoreResult<()> {
        let deleted = self
            .conn
            .execute("DELETE FROM memberships WHERE membership_id = ?1", [id])?;

        if deleted == 0 {
            Err(StoreError::not_found(Entity::Membership, id))
        } else {
            info!(membership_id = id, "deleted membership");
            Ok(())
        }
    }

    /// Memberships of one band with the member names resolved, earliest
    /// tenure first.
    pub fn band_lineup(&self, band_id: i64) -> StoreResult<Vec<LineupEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT ms.membership_id, ms.band_id, ms.member_id, ms.start_year, ms.end_year,
                    ms.role, m.member_name
             FROM memberships ms
             INNER JOIN members m ON m.member_id = ms.member_id
             WHERE ms.band_id = ?1
             ORDER BY ms.start_year IS NULL, ms.start_year, m.member_name COLLATE NOCASE",
        )?;

        let lineup = stmt
            .query_map([band_id], |row| {
                Ok(LineupEntry {
                    membership: membership_from_row(row)?,
                    member_name: row.get(6)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(lineup)
    }

    /// Every tenure one member has held, across all bands.
    pub fn memberships_for_member(&self, member_id: i64) -> StoreResult<Vec<Membership>> {
        let mut stmt = self.conn.prepare(
            "SELECT membership_id, band_id, member_id, start_year, end_year, role
             FROM memberships
             WHERE member_id = ?1
             ORDER BY membership_id",
        )?;

        let memberships = stmt
            .query_map([member_id], membership_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(memberships)
    }

    fn check_membership_refs(&self, fields: &MembershipFields) -> StoreResult<()> {
        if !self.band_exists(fields.band_id)? {
            return Err(StoreError::referential(Entity::Band, fields.band_id));
        }
        if !self.member_exists(fields.member_id)? {
            return Err(StoreError::referential(Entity::Member, fields.member_id));
        }
        Ok(())
    }
}

fn membership_with_id(id: i64, fields: &MembershipFields) -> Membership {
    Membership {
        id,
        band_id: fields.band_id,
        member_id: fields.member_id,
        start_year: fields.start_year,
        end_year: fields.end_year,
        role: fields.role.clone(),
    }
}

#[cfg(test)]
mod tests {
    use crate::input::{NewBand, NewMember};

    use super::*;

    fn seeded() -> (Store, i64, i64) {
        let store = Store::open_in_memory().unwrap();
        let band = store.create_band(&NewBand::new("The Who")).unwrap();
        let member = store.create_member(&NewMember::new("Keith Moon")).unwrap();
        (store, band.id, member.id)
    }

    fn membership_count(store: &Store) -> i64 {
        store
            .conn
            .query_row("SELECT COUNT(*) FROM memberships", [], |row| row.get(0))
            .unwrap()
    }

    #[test]
    fn unknown_band_or_member_is_referential() {
        let (store, band_id, member_id) = seeded();

        let err = store
            .create_membership(&MembershipFields::new(band_id + 100, member_id))
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::Referential {
                entity: Entity::Band,
                ..
            }
        ));

        let err = store
            .create_membership(&MembershipFields::new(band_id, member_id + 100))
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::Referential {
                entity: Entity::Member,
                ..
            }
        ));

        assert_eq!(membership_count(&store), 0);
    }

    #[test]
    fn update_replaces_every_field() {
        let (store, band_id, member_id) = seeded();
        let created = store
            .create_membership(
                &MembershipFields::new(band_id, member_id)
                    .as_role("Drums")
                    .years(Some(1964), Some(1978)),
            )
            .unwrap();

        let updated = store
            .update_membership(
                created.id,
                &MembershipFields::new(band_id, member_id)
                    .as_role("Percussion")
                    .years(Some(1965), None),
            )
            .unwrap();

        let stored = store.get_membership(created.id).unwrap();
        assert_eq!(stored, updated);
        assert_eq!(stored.role.as_deref(), Some("Percussion"));
        assert_eq!(stored.start_year, Some(1965));
        assert_eq!(stored.end_year, None);
        assert!(stored.is_active());

        let lineup = store.band_lineup(band_id).unwrap();
        assert_eq!(lineup.len(), 1);
        assert_eq!(lineup[0].membership, stored);
    }

    #[test]
    fn end_year_zero_is_kept_distinct_from_missing() {
        let (store, band_id, member_id) = seeded();
        let zero = store
            .create_membership(&MembershipFields::new(band_id, member_id).years(None, Some(0)))
            .unwrap();
        let open = store
            .create_membership(&MembershipFields::new(band_id, member_id))
            .unwrap();

        assert_eq!(store.get_membership(zero.id).unwrap().end_year, Some(0));
        assert_eq!(store.get_membership(open.id).unwrap().end_year, None);

        let null_count: i64 = store
            .conn
            .query_row(
                "SELECT COUNT(*) FROM memberships WHERE end_year IS NULL",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(null_count, 1);
    }

    #[test]
    fn update_of_missing_membership_is_not_found() {
        let (store, band_id, member_id) = seeded();
        let err = store
            .update_membership(42, &MembershipFields::new(band_id, member_id))
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn update_checks_references() {
        let (store, band_id, member_id) = seeded();
        let created = store
            .create_membership(&MembershipFields::new(band_id, member_id))
            .unwrap();

        let err = store
            .update_membership(created.id, &MembershipFields::new(999, member_id))
            .unwrap_err();
        assert!(matches!(err, StoreError::Referential { id: 999, .. }));
        assert_eq!(store.get_membership(created.id).unwrap().band_id, band_id);
    }

    #[test]
    fn reversed_years_are_rejected() {
        let (store, band_id, member_id) = seeded();
        let err = store
            .create_membership(
                &MembershipFields::new(band_id, member_id).years(Some(1978), Some(1964)),
            )
            .unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
    }

    #[test]
    fn double_delete_reports_not_found() {
        let (store, band_id, member_id) = seeded();
        let created = store
            .create_membership(&MembershipFields::new(band_id, member_id))
            .unwrap();

        store.delete_membership(created.id).unwrap();
        assert!(store.delete_membership(created.id).unwrap_err().is_not_found());
        assert!(store.get_membership(created.id).unwrap_err().is_not_found());
    }

    #[test]
    fn member_can_hold_several_memberships() {
        let (store, band_id, member_id) = seeded();
        let other = store.create_band(&NewBand::new("The Jeff Beck Group")).unwrap();
        store
            .create_membership(
                &MembershipFields::new(band_id, member_id).years(Some(1964), Some(1970)),
            )
            .unwrap();
        store
            .create_membership(&MembershipFields::new(band_id, member_id).years(Some(1972), None))
            .unwrap();
        store
            .create_membership(&MembershipFields::new(other.id, member_id))
            .unwrap();

        assert_eq!(store.memberships_for_member(member_id).unwrap().len(), 3);
        assert_eq!(store.band_lineup(band_id).unwrap().len(), 2);
    }
}
