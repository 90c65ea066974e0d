use std::{
    io::{Read, Seek, SeekFrom},
    ops::RangeInclusive,
};

use chrono::NaiveDateTime;
use tracing::{debug, warn};
use vigilo_core::{
    binary::{Deserializer, Error, ErrorKind, ResultContextExt},
    primitive::Bool32,
    string::UnrealString,
};
use vigilo_package::{
    compression::{BlockDecompressor, CompressedChunk},
    PACKAGE_MAGIC,
};

use crate::{checksum, datetime};

pub const MIN_SUPPORTED_VERSION: u32 = 20;
pub const MAX_SUPPORTED_VERSION: u32 = 22;

#[derive(Debug, Clone)]
pub struct SaveReadOptions {
    pub supported_versions: RangeInclusive<u32>,
}

impl Default for SaveReadOptions {
    fn default() -> Self {
        Self {
            supported_versions: MIN_SUPPORTED_VERSION..=MAX_SUPPORTED_VERSION,
        }
    }
}

/// The newline-packed description string, split into its positional fields.
/// Which fields exist past index 3 depends on whether the save is tactical.
#[derive(Debug, Clone, Default)]
pub struct SaveDescription {
    pub save_date_time: Option<NaiveDateTime>,
    pub save_name: String,
    pub mission_type_name: String,
    pub operation_name: Option<String>,
    pub game_date_time: Option<NaiveDateTime>,
    pub map_name: Option<String>,
}

/// Fields appended in save version 21 (the expansion's tactical counters).
#[derive(Debug, Clone)]
pub struct MissionCounters {
    pub mission: u32,
    pub month: u32,
    pub turn: u32,
    pub action: u32,
    pub mission_type: String,
    pub debug_save: bool,
    pub pre_mission: bool,
    pub post_mission: bool,
}

/// A parsed save file: the version-gated metadata preamble followed by the
/// embedded package chunks.
#[derive(Debug, Clone)]
pub struct SaveGame {
    pub version: u32,
    pub header_size_check: u32,
    pub checksum: u32,
    /// Recomputed over the header with the stored checksum zeroed; compare
    /// against `checksum` to detect tampering. A mismatch does not fail the
    /// read.
    pub checksum_check: u32,
    pub uncompressed_size: u32,
    pub campaign_number: u32,
    pub save_slot_number: u32,
    pub description: SaveDescription,
    pub save_date_time: Option<NaiveDateTime>,
    pub map_command: String,
    pub tactical: bool,
    pub ironman: bool,
    pub auto_save: bool,
    pub quick_save: bool,
    pub language: String,
    /// Meaning unknown; preserved verbatim.
    pub unknown_6: u32,
    /// Meaning unknown; preserved verbatim.
    pub unknown_7: u32,
    pub archive_file_version: u32,
    pub archive_licensee_version: u32,
    pub campaign_start_date_time: String,
    pub mission_image_uri: String,
    pub player_save_name: String,
    pub dlc_pack_names: Vec<String>,
    pub dlc_pack_friendly_names: Vec<String>,
    /// Present from save version 21 on.
    pub mission_counters: Option<MissionCounters>,
    /// Present from save version 22 on.
    pub ladder: Option<bool>,
    pub chunks: Vec<CompressedChunk>,
}

fn part<'a>(parts: &[&'a str], index: usize) -> &'a str {
    parts.get(index).copied().unwrap_or("")
}

impl SaveGame {
    pub fn read_to_end(
        deserializer: &mut Deserializer<impl Read + Seek>,
        decompressor: &impl BlockDecompressor,
    ) -> Result<Self, Error> {
        Self::read_to_end_with(deserializer, decompressor, SaveReadOptions::default())
    }

    pub fn read_to_end_with(
        deserializer: &mut Deserializer<impl Read + Seek>,
        decompressor: &impl BlockDecompressor,
        options: SaveReadOptions,
    ) -> Result<Self, Error> {
        let version = deserializer
            .deserialize::<u32>()
            .context("cannot read save version")?;
        if !options.supported_versions.contains(&version) {
            return Err(ErrorKind::UnsupportedVersion.make(format!(
                "save version {version} is outside the supported range {}..={}",
                options.supported_versions.start(),
                options.supported_versions.end()
            )));
        }

        let header_size_check = deserializer
            .deserialize::<u32>()
            .context("cannot read save header size")?;
        let checksum = deserializer
            .deserialize::<u32>()
            .context("cannot read save header checksum")?;
        let checksum_check = deserializer
            .detour(0, |deserializer| {
                let mut header = vec![0; header_size_check as usize];
                deserializer
                    .read_bytes(&mut header)
                    .context("cannot re-read the save header")?;
                // The stored checksum occupies bytes 8..12 and is hashed as
                // zero.
                if let Some(stored) = header.get_mut(8..12) {
                    stored.fill(0);
                }
                Ok(checksum::compute(&header))
            })
            .context("cannot compute save header checksum")?;
        if checksum_check != checksum {
            warn!(
                "save header checksum mismatch (stored {checksum:08x}, computed \
                 {checksum_check:08x})"
            );
        }

        let uncompressed_size = deserializer
            .deserialize::<u32>()
            .context("cannot read uncompressed size")?;
        let campaign_number = deserializer
            .deserialize::<u32>()
            .context("cannot read campaign number")?;
        let save_slot_number = deserializer
            .deserialize::<u32>()
            .context("cannot read save slot number")?;

        let description_text = deserializer
            .deserialize::<UnrealString>()
            .context("cannot read save description")?
            .into_string();
        let description_parts: Vec<&str> = description_text.split('\n').collect();

        let date_time_text = deserializer
            .deserialize::<UnrealString>()
            .context("cannot read save date/time")?
            .into_string();
        let date_time_parts: Vec<&str> = date_time_text.split('\n').collect();
        let save_date_time =
            datetime::parse_local_24h(part(&date_time_parts, 0), part(&date_time_parts, 1));

        let map_command = deserializer
            .deserialize::<UnrealString>()
            .context("cannot read map command")?
            .into_string();
        let tactical = bool::from(
            deserializer
                .deserialize::<Bool32>()
                .context("cannot read tactical flag")?,
        );

        // The description's tail is positional and shifts depending on
        // whether the save was made mid-mission.
        let description = SaveDescription {
            save_date_time: datetime::parse_local_24h(
                part(&description_parts, 0),
                part(&description_parts, 1),
            ),
            save_name: part(&description_parts, 2).to_owned(),
            mission_type_name: part(&description_parts, 3).to_owned(),
            operation_name: tactical.then(|| part(&description_parts, 4).to_owned()),
            game_date_time: if tactical {
                datetime::parse_utc_12h(part(&description_parts, 5), part(&description_parts, 6))
            } else {
                datetime::parse_utc_12h(part(&description_parts, 4), part(&description_parts, 5))
            },
            map_name: tactical.then(|| part(&description_parts, 7).to_owned()),
        };

        let ironman = bool::from(
            deserializer
                .deserialize::<Bool32>()
                .context("cannot read ironman flag")?,
        );
        let auto_save = bool::from(
            deserializer
                .deserialize::<Bool32>()
                .context("cannot read auto-save flag")?,
        );
        let quick_save = bool::from(
            deserializer
                .deserialize::<Bool32>()
                .context("cannot read quick-save flag")?,
        );
        let language = deserializer
            .deserialize::<UnrealString>()
            .context("cannot read language")?
            .into_string();
        let unknown_6 = deserializer
            .deserialize::<u32>()
            .context("cannot read reserved field 6")?;
        let unknown_7 = deserializer
            .deserialize::<u32>()
            .context("cannot read reserved field 7")?;
        let archive_file_version = deserializer
            .deserialize::<u32>()
            .context("cannot read archive file version")?;
        let archive_licensee_version = deserializer
            .deserialize::<u32>()
            .context("cannot read archive licensee version")?;
        let campaign_start_date_time = deserializer
            .deserialize::<UnrealString>()
            .context("cannot read campaign start date/time")?
            .into_string();
        let mission_image_uri = deserializer
            .deserialize::<UnrealString>()
            .context("cannot read mission image URI")?
            .into_string();
        let player_save_name = deserializer
            .deserialize::<UnrealString>()
            .context("cannot read player save name")?
            .into_string();

        let dlc_pack_names: Vec<UnrealString> = deserializer
            .deserialize()
            .context("cannot read DLC pack names")?;
        let dlc_pack_friendly_names: Vec<UnrealString> = deserializer
            .deserialize()
            .context("cannot read DLC pack friendly names")?;

        let mission_counters = if version >= 21 {
            Some(MissionCounters {
                mission: deserializer
                    .deserialize()
                    .context("cannot read mission number")?,
                month: deserializer
                    .deserialize()
                    .context("cannot read month number")?,
                turn: deserializer.deserialize().context("cannot read turn")?,
                action: deserializer.deserialize().context("cannot read action")?,
                mission_type: deserializer
                    .deserialize::<UnrealString>()
                    .context("cannot read mission type")?
                    .into_string(),
                debug_save: bool::from(
                    deserializer
                        .deserialize::<Bool32>()
                        .context("cannot read debug-save flag")?,
                ),
                pre_mission: bool::from(
                    deserializer
                        .deserialize::<Bool32>()
                        .context("cannot read pre-mission flag")?,
                ),
                post_mission: bool::from(
                    deserializer
                        .deserialize::<Bool32>()
                        .context("cannot read post-mission flag")?,
                ),
            })
        } else {
            None
        };
        let ladder = if version >= 22 {
            Some(bool::from(
                deserializer
                    .deserialize::<Bool32>()
                    .context("cannot read ladder flag")?,
            ))
        } else {
            None
        };

        // The preamble ends directly at the embedded package data; rewind so
        // the chunk reader sees the magic as the start of its own read.
        let signature = deserializer
            .deserialize::<u32>()
            .context("cannot read the signature that follows the save header")?;
        if signature != PACKAGE_MAGIC {
            return Err(ErrorKind::MissingPackageSignature.make(format!(
                "expected package data to follow the save header, got {signature:08x}"
            )));
        }
        deserializer.seek(SeekFrom::Current(-4))?;

        let mut chunks = Vec::new();
        while !deserializer.end_of_stream() {
            let chunk = CompressedChunk::read(deserializer, decompressor)
                .with_context(|| format!("cannot read compressed chunk {}", chunks.len()))?;
            chunks.push(chunk);
        }
        debug!("Read {} compressed chunks", chunks.len());

        Ok(Self {
            version,
            header_size_check,
            checksum,
            checksum_check,
            uncompressed_size,
            campaign_number,
            save_slot_number,
            description,
            save_date_time,
            map_command,
            tactical,
            ironman,
            auto_save,
            quick_save,
            language,
            unknown_6,
            unknown_7,
            archive_file_version,
            archive_licensee_version,
            campaign_start_date_time,
            mission_image_uri,
            player_save_name,
            dlc_pack_names: dlc_pack_names
                .into_iter()
                .map(UnrealString::into_string)
                .collect(),
            dlc_pack_friendly_names: dlc_pack_friendly_names
                .into_iter()
                .map(UnrealString::into_string)
                .collect(),
            mission_counters,
            ladder,
            chunks,
        })
    }
}
