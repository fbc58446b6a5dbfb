use std::collections::BTreeSet;

use indexmap::IndexSet;

use crate::bin_reader::SpanReader;
use crate::crypt::BlowfishStream;
use crate::errors::ArchiveError;
use crate::hfs;
use crate::lzx;
use crate::platform::Platform;
use crate::title_registry::TitleRegistry;
use crate::zlib;

type Result<T> = std::result::Result<T, ArchiveError>;

pub const ARC_MAGIC: u32 = 0x0043_5241;
pub const ARCC_MAGIC: u32 = 0x4343_5241;
pub const CRA_MAGIC: u32 = 0x4152_4300;

const STANDARD_NAME_WIDTH: usize = 0x40;
const EXTENDED_NAME_WIDTH: usize = 0x80;
const MIN_SCRATCH_SIZE: usize = 0x8000;

pub struct ArcHeader {
    pub magic: u32,
    pub version: u16,
    pub num_files: u16,
}

impl ArcHeader {
    fn read(reader: &mut SpanReader) -> Result<Self> {
        Ok(ArcHeader {
            magic: reader.read_u32()?,
            version: reader.read_u16()?,
            num_files: reader.read_u16()?,
        })
    }

    pub fn is_lzx(&self) -> bool {
        self.version & 0x8000 != 0
    }
}

pub struct ArcEntry {
    pub file_name: String,
    pub type_hash: u32,
    pub compressed_size: u32,
    raw_uncompressed: u32,
    pub offset: u32,
}

impl ArcEntry {
    fn read(reader: &mut SpanReader, name_width: usize) -> Result<Self> {
        Ok(ArcEntry {
            file_name: reader.read_cstr(name_width)?,
            type_hash: reader.read_u32()?,
            compressed_size: reader.read_u32()?,
            raw_uncompressed: reader.read_u32()?,
            offset: reader.read_u32()?,
        })
    }

    /// Output size with the per-title flag bits masked off.
    pub fn uncompressed_size(&self) -> u32 {
        self.raw_uncompressed & 0x1FFF_FFFF
    }

    /// Flag bits some titles pack into the top of the size field.
    pub fn size_flags(&self) -> u8 {
        (self.raw_uncompressed >> 29) as u8
    }
}

/// Sink for extracted archive members.
///
/// The folder methods only fire when `requires_folders` reports true; the
/// defaults reject them the way the plain extraction context does.
pub trait ExtractContext {
    fn requires_folders(&self) -> bool {
        false
    }

    fn add_folder_path(&mut self, _path: &str) -> Result<()> {
        Err(ArchiveError::ImplementationError(
            "AddFolderPath".to_string(),
        ))
    }

    fn generate_folders(&mut self) -> Result<()> {
        Err(ArchiveError::ImplementationError(
            "GenerateFolders".to_string(),
        ))
    }

    fn new_file(&mut self, path: &str) -> Result<()>;

    fn send_data(&mut self, data: &[u8]) -> Result<()>;
}

fn parent_folder(path: &str) -> Option<&str> {
    path.rfind(|c| c == '/' || c == '\\')
        .map(|position| &path[..position])
}

/// Demultiplexes an archive into the extraction sink.
///
/// Peels an optional HFS envelope, derives the stream-native platform from
/// the magic, reads the (possibly encrypted) file table, then emits every
/// entry that passes the class filter in file-table order.
pub fn extract_archive(
    data: &[u8],
    platform: Platform,
    title: &str,
    registry: &TitleRegistry,
    context: &mut dyn ExtractContext,
    class_filter: &BTreeSet<u32>,
) -> Result<()> {
    let stripped = hfs::strip_envelope(data)?;
    let data = stripped.as_deref().unwrap_or(data);
    let mut reader = SpanReader::new(data);

    reader.push();
    let magic = reader.read_u32()?;
    reader.pop();

    let native = if magic == CRA_MAGIC {
        Platform::PS3
    } else {
        Platform::Win32
    };
    let platform = if platform == Platform::Auto {
        native
    } else if platform.is_big_endian() != native.is_big_endian() {
        log::warn!(
            "Platform setting mismatch, using fallback platform: {}",
            native
        );
        native
    } else {
        platform
    };
    reader.set_swap_endian(native.is_big_endian());

    let header = ArcHeader::read(&mut reader)?;
    if header.magic != ARC_MAGIC && header.magic != ARCC_MAGIC {
        return Err(ArchiveError::InvalidHeader(header.magic));
    }
    let encrypted = magic == ARCC_MAGIC;

    let support = registry.title_support(title, platform);
    let name_width = if support.arc.extended_path {
        EXTENDED_NAME_WIDTH
    } else {
        STANDARD_NAME_WIDTH
    };
    let entry_size = name_width + 16;

    let mut cipher = None;
    let mut entries = Vec::with_capacity(header.num_files as usize);
    if encrypted {
        let coder = support
            .arc
            .key
            .as_deref()
            .filter(|key| !key.is_empty())
            .and_then(|key| BlowfishStream::new(key.as_bytes()))
            .ok_or_else(|| ArchiveError::EncryptedArchiveUnsupported(title.to_string()))?;

        let mut table = reader.read_bytes(header.num_files as usize * entry_size)?;
        coder.decode(&mut table);
        let mut table_reader = SpanReader::new(&table);
        for _ in 0..header.num_files {
            entries.push(ArcEntry::read(&mut table_reader, name_width)?);
        }
        cipher = Some(coder);
    } else {
        for _ in 0..header.num_files {
            entries.push(ArcEntry::read(&mut reader, name_width)?);
        }
    }

    let passes_filter =
        |entry: &ArcEntry| class_filter.is_empty() || class_filter.contains(&entry.type_hash);

    if context.requires_folders() {
        let mut folders: IndexSet<String> = IndexSet::new();
        for entry in entries.iter().filter(|entry| passes_filter(*entry)) {
            if let Some(folder) = parent_folder(&entry.file_name) {
                folders.insert(folder.to_string());
            }
        }
        for folder in &folders {
            context.add_folder_path(folder)?;
        }
        context.generate_folders()?;
    }

    // Size both scratch buffers once from the entry maxima; the emit loop
    // below must not resize them.
    let mut max_compressed = 0;
    let mut max_uncompressed = MIN_SCRATCH_SIZE;
    for entry in &entries {
        max_compressed = max_compressed.max(entry.compressed_size as usize);
        max_uncompressed = max_uncompressed.max(entry.uncompressed_size() as usize);
    }
    let mut in_buffer = vec![0u8; max_compressed];
    let mut out_buffer = vec![0u8; max_uncompressed];

    for entry in &entries {
        if entry.compressed_size == 0 {
            continue;
        }
        if !passes_filter(entry) {
            continue;
        }

        reader.seek(entry.offset as usize);
        let compressed = entry.compressed_size as usize;
        let uncompressed = entry.uncompressed_size() as usize;

        if compressed == uncompressed {
            // Stored entry; nothing to inflate.
            reader.read_exact(&mut out_buffer[..compressed])?;
            if let Some(coder) = &cipher {
                coder.decode(&mut out_buffer[..compressed]);
            }
        } else {
            reader.read_exact(&mut in_buffer[..compressed])?;
            if let Some(coder) = &cipher {
                coder.decode(&mut in_buffer[..compressed]);
            }
            if header.is_lzx() {
                let window_bits = if magic == ARC_MAGIC { 17 } else { 15 };
                lzx::decompress_lzx(
                    &in_buffer[..compressed],
                    &mut out_buffer[..uncompressed],
                    window_bits,
                )?;
            } else {
                zlib::inflate_into(&in_buffer[..compressed], &mut out_buffer[..uncompressed])?;
            }
        }

        let path = match registry.extension_for(entry.type_hash, title, platform) {
            Some(extension) => format!("{}.{}", entry.file_name, extension),
            None => format!("{}.{:08X}", entry.file_name, entry.type_hash),
        };
        context.new_file(&path)?;
        context.send_data(&out_buffer[..uncompressed])?;
    }

    Ok(())
}

/// Cheap member-count probe that understands the HFS envelope but reads no
/// file data.
pub fn archive_entry_count(data: &[u8]) -> Result<u16> {
    let stripped = hfs::strip_envelope(data)?;
    let data = stripped.as_deref().unwrap_or(data);
    let mut reader = SpanReader::new(data);

    reader.push();
    let magic = reader.read_u32()?;
    reader.pop();
    reader.set_swap_endian(magic == CRA_MAGIC);

    let header = ArcHeader::read(&mut reader)?;
    if header.magic != ARC_MAGIC && header.magic != ARCC_MAGIC {
        return Err(ArchiveError::InvalidHeader(header.magic));
    }
    Ok(header.num_files)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::title_registry::{hash_v1, ArcSupport, TitleSupport};
    use crate::utils::StreamBuilder;

    #[derive(Default)]
    struct MemorySink {
        wants_folders: bool,
        folders: Vec<String>,
        files: Vec<(String, Vec<u8>)>,
        current: Option<String>,
    }

    impl ExtractContext for MemorySink {
        fn requires_folders(&self) -> bool {
            self.wants_folders
        }

        fn add_folder_path(&mut self, path: &str) -> Result<()> {
            self.folders.push(path.to_string());
            Ok(())
        }

        fn generate_folders(&mut self) -> Result<()> {
            Ok(())
        }

        fn new_file(&mut self, path: &str) -> Result<()> {
            self.current = Some(path.to_string());
            Ok(())
        }

        fn send_data(&mut self, data: &[u8]) -> Result<()> {
            let path = self.current.take().expect("send_data before new_file");
            self.files.push((path, data.to_vec()));
            Ok(())
        }
    }

    struct EntrySpec {
        name: &'static str,
        type_hash: u32,
        uncompressed: u32,
        payload: Vec<u8>,
    }

    fn build_archive(builder: &mut StreamBuilder, magic: u32, entries: &[EntrySpec]) {
        builder.u32(magic);
        builder.u16(0x0007);
        builder.u16(entries.len() as u16);
        let mut offset = 0x800u32;
        for entry in entries {
            builder.cstr(entry.name, STANDARD_NAME_WIDTH);
            builder.u32(entry.type_hash);
            builder.u32(entry.payload.len() as u32);
            builder.u32(entry.uncompressed);
            builder.u32(if entry.payload.is_empty() { 0 } else { offset });
            offset += entry.payload.len() as u32;
        }
        let mut offset = 0x800usize;
        for entry in entries {
            if entry.payload.is_empty() {
                continue;
            }
            builder.pad_to(offset);
            builder.bytes(&entry.payload);
            offset += entry.payload.len();
        }
    }

    // zlib stream for the bytes 01 02 03 04.
    const ZLIB_PAYLOAD: [u8; 12] = [
        0x78, 0x9C, 0x63, 0x64, 0x62, 0x66, 0x01, 0x00, 0x00, 0x18, 0x00, 0x0B,
    ];

    #[test]
    fn stored_entry_with_hex_extension() {
        let mut builder = StreamBuilder::new();
        build_archive(
            &mut builder,
            ARC_MAGIC,
            &[EntrySpec {
                name: "a/b.bin",
                type_hash: 0xDEADBEEF,
                uncompressed: 4,
                payload: vec![1, 2, 3, 4],
            }],
        );

        let registry = TitleRegistry::new();
        let mut sink = MemorySink::default();
        extract_archive(
            &builder.finish(),
            Platform::Auto,
            "",
            &registry,
            &mut sink,
            &BTreeSet::new(),
        )
        .unwrap();

        assert_eq!(1, sink.files.len());
        assert_eq!("a/b.bin.DEADBEEF", sink.files[0].0);
        assert_eq!(vec![1, 2, 3, 4], sink.files[0].1);
    }

    #[test]
    fn zlib_entry_inflates() {
        let mut builder = StreamBuilder::new();
        build_archive(
            &mut builder,
            ARC_MAGIC,
            &[EntrySpec {
                name: "a/b.bin",
                type_hash: 0xDEADBEEF,
                uncompressed: 4,
                payload: ZLIB_PAYLOAD.to_vec(),
            }],
        );

        let registry = TitleRegistry::new();
        let mut sink = MemorySink::default();
        extract_archive(
            &builder.finish(),
            Platform::Auto,
            "",
            &registry,
            &mut sink,
            &BTreeSet::new(),
        )
        .unwrap();

        assert_eq!(vec![1, 2, 3, 4], sink.files[0].1);
    }

    #[test]
    fn encrypted_archive_without_key_fails() {
        let mut builder = StreamBuilder::new();
        build_archive(&mut builder, ARCC_MAGIC, &[]);

        let registry = TitleRegistry::new();
        let mut sink = MemorySink::default();
        let result = extract_archive(
            &builder.finish(),
            Platform::Auto,
            "NoKey",
            &registry,
            &mut sink,
            &BTreeSet::new(),
        );
        assert!(matches!(
            result,
            Err(ArchiveError::EncryptedArchiveUnsupported(title)) if title == "NoKey"
        ));
    }

    #[test]
    fn encrypted_archive_roundtrips() {
        let key = "ArchiveTestKey";
        let coder = BlowfishStream::new(key.as_bytes()).unwrap();

        let mut encrypted_payload = ZLIB_PAYLOAD.to_vec();
        coder.encode(&mut encrypted_payload);

        let mut builder = StreamBuilder::new();
        build_archive(
            &mut builder,
            ARCC_MAGIC,
            &[EntrySpec {
                name: "sec\\file",
                type_hash: 0x00000042,
                uncompressed: 4,
                payload: encrypted_payload,
            }],
        );
        let mut data = builder.finish();
        // Encrypt the file table in place, as the container stores it.
        let table_end = 8 + STANDARD_NAME_WIDTH + 16;
        coder.encode(&mut data[8..table_end]);

        let mut registry = TitleRegistry::new();
        registry.register_title(
            "Locked",
            TitleSupport {
                arc: ArcSupport {
                    extended_path: false,
                    key: Some(key.to_string()),
                },
            },
        );
        let mut sink = MemorySink::default();
        extract_archive(
            &data,
            Platform::Auto,
            "Locked",
            &registry,
            &mut sink,
            &BTreeSet::new(),
        )
        .unwrap();

        assert_eq!(1, sink.files.len());
        assert_eq!("sec\\file.00000042", sink.files[0].0);
        assert_eq!(vec![1, 2, 3, 4], sink.files[0].1);
    }

    #[test]
    fn envelope_wrapped_archive_extracts() {
        let mut builder = StreamBuilder::new();
        build_archive(
            &mut builder,
            ARC_MAGIC,
            &[EntrySpec {
                name: "a/b.bin",
                type_hash: 0xDEADBEEF,
                uncompressed: 4,
                payload: vec![1, 2, 3, 4],
            }],
        );
        let inner = builder.finish();

        let mut wrapped = StreamBuilder::new();
        wrapped.u32(hfs::SFH_MAGIC);
        wrapped.u16(1);
        wrapped.u16(0);
        wrapped.u32(inner.len() as u32);
        wrapped.u32(inner.len() as u32);
        wrapped.bytes(&inner);

        let registry = TitleRegistry::new();
        let mut sink = MemorySink::default();
        extract_archive(
            &wrapped.finish(),
            Platform::Auto,
            "",
            &registry,
            &mut sink,
            &BTreeSet::new(),
        )
        .unwrap();

        assert_eq!(1, sink.files.len());
        assert_eq!("a/b.bin.DEADBEEF", sink.files[0].0);
        assert_eq!(vec![1, 2, 3, 4], sink.files[0].1);
    }

    #[test]
    fn placeholders_and_filtered_entries_are_skipped() {
        let keep = hash_v1("rTexture");
        let mut builder = StreamBuilder::new();
        build_archive(
            &mut builder,
            ARC_MAGIC,
            &[
                EntrySpec {
                    name: "skipped/placeholder",
                    type_hash: keep,
                    uncompressed: 0,
                    payload: Vec::new(),
                },
                EntrySpec {
                    name: "kept/texture",
                    type_hash: keep,
                    uncompressed: 4,
                    payload: vec![9, 9, 9, 9],
                },
                EntrySpec {
                    name: "filtered/model",
                    type_hash: hash_v1("rModel"),
                    uncompressed: 4,
                    payload: vec![8, 8, 8, 8],
                },
            ],
        );

        let registry = TitleRegistry::with_defaults();
        let mut sink = MemorySink::default();
        let mut filter = BTreeSet::new();
        filter.insert(keep);
        extract_archive(
            &builder.finish(),
            Platform::Auto,
            "",
            &registry,
            &mut sink,
            &filter,
        )
        .unwrap();

        assert_eq!(1, sink.files.len());
        assert_eq!("kept/texture.tex", sink.files[0].0);
    }

    #[test]
    fn folder_precreation_collects_parents_in_order() {
        let mut builder = StreamBuilder::new();
        build_archive(
            &mut builder,
            ARC_MAGIC,
            &[
                EntrySpec {
                    name: "ui/menu/a",
                    type_hash: 1,
                    uncompressed: 4,
                    payload: vec![1, 2, 3, 4],
                },
                EntrySpec {
                    name: "ui/menu/b",
                    type_hash: 1,
                    uncompressed: 4,
                    payload: vec![1, 2, 3, 4],
                },
                EntrySpec {
                    name: "fx\\smoke",
                    type_hash: 1,
                    uncompressed: 4,
                    payload: vec![1, 2, 3, 4],
                },
            ],
        );

        let registry = TitleRegistry::new();
        let mut sink = MemorySink {
            wants_folders: true,
            ..MemorySink::default()
        };
        extract_archive(
            &builder.finish(),
            Platform::Auto,
            "",
            &registry,
            &mut sink,
            &BTreeSet::new(),
        )
        .unwrap();

        assert_eq!(vec!["ui/menu".to_string(), "fx".to_string()], sink.folders);
        assert_eq!(3, sink.files.len());
    }

    #[test]
    fn big_endian_archive_overrides_platform_hint() {
        let mut builder = StreamBuilder::big_endian();
        builder.u32(ARC_MAGIC);
        builder.u16(0x0007);
        builder.u16(1);
        builder.cstr("stored", STANDARD_NAME_WIDTH);
        builder.u32(0x31);
        builder.u32(4);
        builder.u32(4);
        builder.u32(0x800);
        builder.pad_to(0x800);
        builder.bytes(&[5, 6, 7, 8]);

        let registry = TitleRegistry::new();
        let mut sink = MemorySink::default();
        // Win32 hint mismatches the big-endian stream and must fall back.
        extract_archive(
            &builder.finish(),
            Platform::Win32,
            "",
            &registry,
            &mut sink,
            &BTreeSet::new(),
        )
        .unwrap();

        assert_eq!(1, sink.files.len());
        assert_eq!("stored.00000031", sink.files[0].0);
        assert_eq!(vec![5, 6, 7, 8], sink.files[0].1);
    }

    #[test]
    fn extended_entry_layout_reads_wide_names() {
        let long_name = "very/long/path/segments/that/overflow/the/narrow/name/field/entry";
        let mut builder = StreamBuilder::new();
        builder.u32(ARC_MAGIC);
        builder.u16(0x0007);
        builder.u16(1);
        builder.cstr(long_name, EXTENDED_NAME_WIDTH);
        builder.u32(0x10);
        builder.u32(4);
        builder.u32(4);
        builder.u32(0x800);
        builder.pad_to(0x800);
        builder.bytes(&[1, 1, 2, 2]);

        let mut registry = TitleRegistry::new();
        registry.register_title(
            "Wide",
            TitleSupport {
                arc: ArcSupport {
                    extended_path: true,
                    key: None,
                },
            },
        );
        let mut sink = MemorySink::default();
        extract_archive(
            &builder.finish(),
            Platform::Auto,
            "Wide",
            &registry,
            &mut sink,
            &BTreeSet::new(),
        )
        .unwrap();

        assert_eq!(format!("{}.00000010", long_name), sink.files[0].0);
        assert_eq!(vec![1, 1, 2, 2], sink.files[0].1);
    }

    #[test]
    fn entry_count_probe() {
        let mut builder = StreamBuilder::new();
        build_archive(
            &mut builder,
            ARC_MAGIC,
            &[
                EntrySpec {
                    name: "one",
                    type_hash: 1,
                    uncompressed: 4,
                    payload: vec![0; 4],
                },
                EntrySpec {
                    name: "two",
                    type_hash: 2,
                    uncompressed: 4,
                    payload: vec![0; 4],
                },
            ],
        );
        let data = builder.finish();
        assert_eq!(2, archive_entry_count(&data).unwrap());

        let mut wrapped = StreamBuilder::new();
        wrapped.u32(hfs::SFH_MAGIC);
        wrapped.u16(1);
        wrapped.u16(0);
        wrapped.u32(data.len() as u32);
        wrapped.u32(data.len() as u32);
        wrapped.bytes(&data);
        assert_eq!(2, archive_entry_count(&wrapped.finish()).unwrap());

        assert!(matches!(
            archive_entry_count(&[0x50, 0x41, 0x4B, 0x00, 0, 0, 0, 0]),
            Err(ArchiveError::InvalidHeader(_))
        ));
    }

    #[test]
    fn size_flag_bits_are_masked() {
        let mut builder = StreamBuilder::new();
        builder.u32(ARC_MAGIC);
        builder.u16(0x0007);
        builder.u16(1);
        builder.cstr("flagged", STANDARD_NAME_WIDTH);
        builder.u32(0x22);
        builder.u32(4);
        builder.u32(4 | (0x5 << 29));
        builder.u32(0x800);
        builder.pad_to(0x800);
        builder.bytes(&[3, 1, 4, 1]);

        let registry = TitleRegistry::new();
        let mut sink = MemorySink::default();
        extract_archive(
            &builder.finish(),
            Platform::Auto,
            "",
            &registry,
            &mut sink,
            &BTreeSet::new(),
        )
        .unwrap();

        assert_eq!(vec![3, 1, 4, 1], sink.files[0].1);
    }

    #[test]
    fn lzx_flag_derives_from_version() {
        let header = ArcHeader {
            magic: ARC_MAGIC,
            version: 0x8007,
            num_files: 0,
        };
        assert!(header.is_lzx());
        let header = ArcHeader {
            magic: ARC_MAGIC,
            version: 0x0007,
            num_files: 0,
        };
        assert!(!header.is_lzx());
    }
}
