use rusqlite::{params, OptionalExtension, Row};
use tracing::{debug, info, warn};

use crate::error::{Entity, StoreError, StoreResult, ValidationErrors};
use crate::input::{NewAlbum, ALBUM_REQUIRED_MESSAGE};
use crate::models::{Album, AlbumDetail, BandSummary};

use super::Store;

fn album_from_row(row: &Row<'_>) -> rusqlite::Result<Album> {
    Ok(Album {
        id: row.get(0)?,
        band_id: row.get(1)?,
        title: row.get(2)?,
        release_year: row.get(3)?,
    })
}

impl Store {
    pub fn get_album(&self, id: i64) -> StoreResult<Album> {
        self.conn
            .query_row(
                "SELECT album_id, band_id, album_title, release_year
                 FROM albums
                 WHERE album_id = ?1",
                [id],
                album_from_row,
            )
            .optional()?
            .ok_or_else(|| StoreError::not_found(Entity::Album, id))
    }

    /// Insert an album and credit its contributing bands in one transaction.
    /// Contributor ids that do not name an existing band are skipped.
    pub fn create_album(&mut self, album: &NewAlbum) -> StoreResult<Album> {
        album.validate()?;
        if !self.band_exists(album.band_id)? {
            return Err(ValidationErrors::single("band_id", ALBUM_REQUIRED_MESSAGE).into());
        }

        let tx = self.conn.transaction()?;
        tx.execute(
            "INSERT INTO albums (band_id, album_title, release_year) VALUES (?1, ?2, ?3)",
            params![album.band_id, album.title, album.release_year],
        )?;
        let id = tx.last_insert_rowid();

        let mut credited = 0usize;
        for &band_id in &album.contributing_band_ids {
            let exists = tx
                .query_row("SELECT 1 FROM bands WHERE band_id = ?1", [band_id], |_| Ok(()))
                .optional()?
                .is_some();
            if !exists {
                warn!(album_id = id, band_id, "skipping unknown contributing band");
                continue;
            }
            credited += tx.execute(
                "INSERT OR IGNORE INTO album_contributors (album_id, band_id) VALUES (?1, ?2)",
                params![id, band_id],
            )?;
        }
        tx.commit()?;

        info!(album_id = id, band_id = album.band_id, credited, "created album");
        Ok(Album {
            id,
            band_id: album.band_id,
            title: album.title.clone(),
            release_year: album.release_year,
        })
    }

    /// Albums whose primary band is `band_id`, oldest release first.
    pub fn albums_by_band(&self, band_id: i64) -> StoreResult<Vec<Album>> {
        let mut stmt = self.conn.prepare(
            "SELECT album_id, band_id, album_title, release_year
             FROM albums
             WHERE band_id = ?1
             ORDER BY release_year IS NULL, release_year, album_title COLLATE NOCASE",
        )?;

        let albums = stmt
            .query_map([band_id], album_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(albums)
    }

    /// Albums on which `band_id` is credited as a contributor.
    pub fn contributed_albums(&self, band_id: i64) -> StoreResult<Vec<Album>> {
        let mut stmt = self.conn.prepare(
            "SELECT a.album_id, a.band_id, a.album_title, a.release_year
             FROM albums a
             INNER JOIN album_contributors ac ON ac.album_id = a.album_id
             WHERE ac.band_id = ?1
             ORDER BY a.release_year IS NULL, a.release_year, a.album_title COLLATE NOCASE",
        )?;

        let albums = stmt
            .query_map([band_id], album_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(albums)
    }

    pub fn album_contributors(&self, album_id: i64) -> StoreResult<Vec<BandSummary>> {
        let mut stmt = self.conn.prepare(
            "SELECT b.band_id, b.band_name
             FROM bands b
             INNER JOIN album_contributors ac ON ac.band_id = b.band_id
             WHERE ac.album_id = ?1
             ORDER BY b.band_name COLLATE NOCASE",
        )?;

        let bands = stmt
            .query_map([album_id], |row| {
                Ok(BandSummary {
                    id: row.get(0)?,
                    name: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(bands)
    }

    pub fn album_detail(&self, id: i64) -> StoreResult<AlbumDetail> {
        let album = self.get_album(id)?;
        self.album_detail_for(album)
    }

    pub(crate) fn album_detail_for(&self, album: Album) -> StoreResult<AlbumDetail> {
        let primary_band = self.get_band(album.band_id)?.summary();
        let contributors = self.album_contributors(album.id)?;
        debug!(album_id = album.id, contributors = contributors.len(), "loaded album");

        Ok(AlbumDetail {
            album,
            primary_band,
            contributors,
        })
    }
}
