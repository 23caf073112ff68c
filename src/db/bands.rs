use rusqlite::{params, OptionalExtension, Row};
use tracing::{debug, info, warn};

use crate::error::{Entity, StoreError, StoreResult};
use crate::input::NewBand;
use crate::models::{Band, BandDetail, BandSummary};

use super::Store;

fn band_from_row(row: &Row<'_>) -> rusqlite::Result<Band> {
    Ok(Band {
        id: row.get(0)?,
        name: row.get(1)?,
        formed_year: row.get(2)?,
        home_location: row.get(3)?,
    })
}

impl Store {
    /// Every band in identity order. Callers should not rely on the order.
    pub fn list_bands(&self) -> StoreResult<Vec<Band>> {
        let mut stmt = self.conn.prepare(
            "SELECT band_id, band_name, formed_year, home_location
             FROM bands
             ORDER BY band_id",
        )?;

        let bands = stmt
            .query_map([], band_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        debug!(count = bands.len(), "listed bands");

        Ok(bands)
    }

    /// The `{id, name}` listing used for data interchange and pickers.
    pub fn band_summaries(&self) -> StoreResult<Vec<BandSummary>> {
        let mut stmt = self
            .conn
            .prepare("SELECT band_id, band_name FROM bands ORDER BY band_id")?;

        let summaries = stmt
            .query_map([], |row| {
                Ok(BandSummary {
                    id: row.get(0)?,
                    name: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(summaries)
    }

    pub fn get_band(&self, id: i64) -> StoreResult<Band> {
        self.conn
            .query_row(
                "SELECT band_id, band_name, formed_year, home_location
                 FROM bands
                 WHERE band_id = ?1",
                [id],
                band_from_row,
            )
            .optional()?
            .ok_or_else(|| StoreError::not_found(Entity::Band, id))
    }

    /// Insert a band and return it with its new identity. Duplicate names are
    /// allowed.
    pub fn create_band(&self, band: &NewBand) -> StoreResult<Band> {
        band.validate()?;

        self.conn.execute(
            "INSERT INTO bands (band_name, formed_year, home_location) VALUES (?1, ?2, ?3)",
            params![band.name, band.formed_year, band.home_location],
        )?;

        let id = self.conn.last_insert_rowid();
        info!(band_id = id, name = %band.name, "created band");
        Ok(Band {
            id,
            name: band.name.clone(),
            formed_year: band.formed_year,
            home_location: band.home_location.clone(),
        })
    }

    /// Remove a band that nothing depends on. Memberships and primary albums
    /// block the delete; contributor credits on other albums go with the band.
    pub fn delete_band(&self, id: i64) -> StoreResult<()> {
        if !self.band_exists(id)? {
            return Err(StoreError::not_found(Entity::Band, id));
        }

        let memberships: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM memberships WHERE band_id = ?1",
            [id],
            |row| row.get(0),
        )?;
        let albums: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM albums WHERE band_id = ?1",
            [id],
            |row| row.get(0),
        )?;
        if memberships > 0 || albums > 0 {
            warn!(band_id = id, memberships, albums, "refused to delete band with dependents");
            return Err(StoreError::HasDependents {
                entity: Entity::Band,
                id,
                memberships,
                albums,
            });
        }

        self.conn.execute("DELETE FROM bands WHERE band_id = ?1", [id])?;
        info!(band_id = id, "deleted band");
        Ok(())
    }

    /// Gather the band together with its lineup, its own albums and the albums
    /// it is credited on.
    pub fn band_detail(&self, id: i64) -> StoreResult<BandDetail> {
        let band = self.get_band(id)?;
        let lineup = self.band_lineup(id)?;
        let albums = self
            .albums_by_band(id)?
            .into_iter()
            .map(|album| self.album_detail_for(album))
            .collect::<StoreResult<Vec<_>>>()?;
        let contributed_albums = self
            .contributed_albums(id)?
            .into_iter()
            .map(|album| self.album_detail_for(album))
            .collect::<StoreResult<Vec<_>>>()?;

        Ok(BandDetail {
            band,
            lineup,
            albums,
            contributed_albums,
        })
    }

    pub(crate) fn band_exists(&self, id: i64) -> StoreResult<bool> {
        self.row_exists("bands", "band_id", id)
    }
}
