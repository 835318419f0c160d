use super::backend::{DocumentBackend, ImagePage, PageSize, Protection, TextOverlay};
use anyhow::{anyhow, bail, Context, Result};
use lopdf::content::{Content, Operation};
use lopdf::{
    Dictionary, Document, EncryptionState, EncryptionVersion, Object, ObjectId, Permissions,
    Stream, StringFormat,
};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::debug;

/// Page attributes a page may inherit from its ancestors in the page tree.
const INHERITABLE: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Guards parent-chain walks against malformed, cyclic page trees.
const MAX_TREE_DEPTH: usize = 64;

const ENCRYPT_KEY: &[u8] = b"/Encrypt";
const HIDDEN_ENCRYPT_KEY: &[u8] = b"EncrypT";

/// RC4 key length used when protecting documents, in bits.
const KEY_LENGTH: usize = 128;

/// [`DocumentBackend`] backed by `lopdf`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LopdfBackend;

impl LopdfBackend {
    pub fn open<P: AsRef<Path>>(&self, path: P) -> Result<Document> {
        let path = path.as_ref();
        let bytes =
            std::fs::read(path).with_context(|| format!("Failed to read PDF: {}", path.display()))?;
        self.load(&bytes)
            .with_context(|| format!("Failed to open PDF: {}", path.display()))
    }

    pub fn write<P: AsRef<Path>>(&self, doc: &mut Document, path: P) -> Result<()> {
        let path = path.as_ref();
        let bytes = self.save(doc)?;
        std::fs::write(path, bytes)
            .with_context(|| format!("Failed to save PDF: {}", path.display()))
    }
}

impl DocumentBackend for LopdfBackend {
    type Document = Document;

    fn load(&self, bytes: &[u8]) -> Result<Document> {
        Document::load_mem(bytes).context("Failed to parse PDF")
    }

    fn save(&self, doc: &mut Document) -> Result<Vec<u8>> {
        if !doc.is_encrypted() {
            doc.compress();
        }
        let mut buffer = Vec::new();
        doc.save_to(&mut buffer).context("Failed to serialize PDF")?;
        Ok(buffer)
    }

    fn page_count(&self, doc: &Document) -> usize {
        doc.get_pages().len()
    }

    fn page_size(&self, doc: &Document, index: usize) -> Result<PageSize> {
        let page_id = page_id(doc, index)?;
        let size = inherited(doc, page_id, b"MediaBox")
            .and_then(|obj| resolve(doc, obj).as_array().ok())
            .and_then(|arr| media_box_size(arr))
            .unwrap_or(PageSize::LETTER);
        Ok(size)
    }

    fn merge(&self, docs: Vec<Document>) -> Result<Document> {
        let mut docs = docs.into_iter();
        let mut dest = docs
            .next()
            .ok_or_else(|| anyhow!("No documents to merge"))?;

        push_down_inherited(&mut dest)?;
        let root_pages = pages_root(&dest)?;
        let mut kids: Vec<ObjectId> = dest.get_pages().into_values().collect();

        for (i, mut source) in docs.enumerate() {
            push_down_inherited(&mut source)?;
            source.renumber_objects_with(dest.max_id + 1);

            let source_catalog = source
                .trailer
                .get(b"Root")
                .and_then(Object::as_reference)
                .with_context(|| format!("Document {} has no catalog", i + 2))?;
            let source_root_pages = pages_root(&source)?;
            let source_pages: Vec<ObjectId> = source.get_pages().into_values().collect();
            debug!(pages = source_pages.len(), "appending document {}", i + 2);

            dest.max_id = dest.max_id.max(source.max_id);
            for (id, object) in source.objects {
                if id != source_catalog && id != source_root_pages {
                    dest.objects.insert(id, object);
                }
            }
            kids.extend(source_pages);
        }

        for &page in &kids {
            dest.get_dictionary_mut(page)?
                .set("Parent", Object::Reference(root_pages));
        }
        let pages_dict = dest.get_dictionary_mut(root_pages)?;
        pages_dict.set("Count", Object::Integer(kids.len() as i64));
        pages_dict.set(
            "Kids",
            Object::Array(kids.into_iter().map(Object::Reference).collect()),
        );

        dest.prune_objects();
        Ok(dest)
    }

    fn copy_pages(&self, doc: &Document, indices: &[usize]) -> Result<Document> {
        let total = self.page_count(doc);
        if let Some(&bad) = indices.iter().find(|&&i| i >= total) {
            anyhow::bail!("Page {} is out of range (1-{})", bad + 1, total);
        }

        // Delete pages NOT in our list
        let pages_to_delete: Vec<u32> = (0..total)
            .filter(|i| !indices.contains(i))
            .map(|i| i as u32 + 1)
            .collect();

        let mut new_doc = doc.clone();
        if !pages_to_delete.is_empty() {
            new_doc.delete_pages(&pages_to_delete);
            new_doc.prune_objects();
        }
        Ok(new_doc)
    }

    fn rotation(&self, doc: &Document, index: usize) -> Result<i64> {
        let page_id = page_id(doc, index)?;
        Ok(inherited(doc, page_id, b"Rotate")
            .and_then(|obj| resolve(doc, obj).as_i64().ok())
            .unwrap_or(0))
    }

    fn set_rotation(&self, doc: &mut Document, index: usize, degrees: i64) -> Result<()> {
        let page_id = page_id(doc, index)?;
        doc.get_dictionary_mut(page_id)?
            .set("Rotate", Object::Integer(degrees));
        Ok(())
    }

    fn draw_text(&self, doc: &mut Document, index: usize, overlay: &TextOverlay) -> Result<()> {
        let page_id = page_id(doc, index)?;
        if !overlay.opacity.is_finite() || !overlay.size.is_finite() {
            bail!("Text overlay needs a finite size and opacity");
        }

        let mut font = Dictionary::new();
        font.set("Type", Object::Name(b"Font".to_vec()));
        font.set("Subtype", Object::Name(b"Type1".to_vec()));
        font.set("BaseFont", Object::Name(overlay.font.base_font().as_bytes().to_vec()));
        font.set("Encoding", Object::Name(b"WinAnsiEncoding".to_vec()));
        let font_id = doc.add_object(font);

        let opacity = overlay.opacity.clamp(0.0, 1.0);
        let mut state = Dictionary::new();
        state.set("Type", Object::Name(b"ExtGState".to_vec()));
        state.set("ca", Object::Real(opacity));
        state.set("CA", Object::Real(opacity));
        let state_id = doc.add_object(state);

        let mut resources = own_resources(doc, page_id)?;
        let font_name = register_resource(doc, &mut resources, b"Font", "DtF", font_id)?;
        let state_name = register_resource(doc, &mut resources, b"ExtGState", "DtGS", state_id)?;
        doc.get_dictionary_mut(page_id)?
            .set("Resources", Object::Dictionary(resources));

        let (sin, cos) = overlay.rotation.to_radians().sin_cos();
        let content = Content {
            operations: vec![
                Operation::new("q", vec![]),
                Operation::new("gs", vec![Object::Name(state_name)]),
                Operation::new(
                    "rg",
                    vec![
                        Object::Real(overlay.color.r),
                        Object::Real(overlay.color.g),
                        Object::Real(overlay.color.b),
                    ],
                ),
                Operation::new("BT", vec![]),
                Operation::new(
                    "Tf",
                    vec![Object::Name(font_name), Object::Real(overlay.size)],
                ),
                Operation::new(
                    "Tm",
                    vec![
                        Object::Real(cos),
                        Object::Real(sin),
                        Object::Real(-sin),
                        Object::Real(cos),
                        Object::Real(overlay.x),
                        Object::Real(overlay.y),
                    ],
                ),
                Operation::new(
                    "Tj",
                    vec![Object::String(
                        win_ansi_bytes(&overlay.text),
                        StringFormat::Literal,
                    )],
                ),
                Operation::new("ET", vec![]),
                Operation::new("Q", vec![]),
            ],
        };
        isolate_contents(doc, page_id)?;
        doc.add_page_contents(page_id, content.encode()?)?;
        Ok(())
    }

    fn remove_page(&self, doc: &mut Document, index: usize) -> Result<()> {
        page_id(doc, index)?;
        doc.delete_pages(&[index as u32 + 1]);
        doc.prune_objects();
        Ok(())
    }

    fn image_document(&self, pages: &[ImagePage<'_>]) -> Result<Document> {
        if pages.is_empty() {
            bail!("No images to convert");
        }

        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let mut kids = Vec::with_capacity(pages.len());

        for page in pages {
            let info = &page.info;
            let mut image = Dictionary::new();
            image.set("Type", Object::Name(b"XObject".to_vec()));
            image.set("Subtype", Object::Name(b"Image".to_vec()));
            image.set("Width", Object::Integer(i64::from(info.width)));
            image.set("Height", Object::Integer(i64::from(info.height)));
            image.set(
                "ColorSpace",
                Object::Name(info.color_space().as_bytes().to_vec()),
            );
            image.set(
                "BitsPerComponent",
                Object::Integer(i64::from(info.bits_per_component)),
            );
            image.set("Filter", Object::Name(b"DCTDecode".to_vec()));
            if info.components == 4 && info.adobe {
                let decode = [1, 0, 1, 0, 1, 0, 1, 0].map(Object::Integer);
                image.set("Decode", Object::Array(decode.to_vec()));
            }
            let image_id = doc.add_object(Stream::new(image, page.data.to_vec()));

            let content = Content {
                operations: vec![
                    Operation::new("q", vec![]),
                    Operation::new(
                        "cm",
                        vec![
                            Object::Real(page.width),
                            Object::Integer(0),
                            Object::Integer(0),
                            Object::Real(page.height),
                            Object::Real(page.x),
                            Object::Real(page.y),
                        ],
                    ),
                    Operation::new("Do", vec![Object::Name(b"Im1".to_vec())]),
                    Operation::new("Q", vec![]),
                ],
            };
            let content_id = doc.add_object(Stream::new(Dictionary::new(), content.encode()?));

            let images = Dictionary::from_iter(vec![("Im1", Object::Reference(image_id))]);
            let resources = Dictionary::from_iter(vec![("XObject", Object::Dictionary(images))]);
            let page_dict = Dictionary::from_iter(vec![
                ("Type", Object::Name(b"Page".to_vec())),
                ("Parent", Object::Reference(pages_id)),
                (
                    "MediaBox",
                    Object::Array(vec![
                        Object::Integer(0),
                        Object::Integer(0),
                        Object::Real(page.page.width),
                        Object::Real(page.page.height),
                    ]),
                ),
                ("Resources", Object::Dictionary(resources)),
                ("Contents", Object::Reference(content_id)),
            ]);
            kids.push(doc.add_object(page_dict));
        }

        let pages_dict = Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Pages".to_vec())),
            ("Count", Object::Integer(kids.len() as i64)),
            (
                "Kids",
                Object::Array(kids.into_iter().map(Object::Reference).collect()),
            ),
        ]);
        doc.objects.insert(pages_id, Object::Dictionary(pages_dict));

        let catalog = Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Catalog".to_vec())),
            ("Pages", Object::Reference(pages_id)),
        ]);
        let catalog_id = doc.add_object(catalog);
        doc.trailer.set("Root", Object::Reference(catalog_id));
        Ok(doc)
    }

    fn is_protected(&self, doc: &Document) -> bool {
        doc.is_encrypted()
    }

    fn protect(&self, doc: &mut Document, protection: &Protection) -> Result<()> {
        if doc.is_encrypted() {
            bail!("PDF is already password protected");
        }
        ensure_file_id(doc);
        // Filters apply beneath encryption, so streams are compressed first
        // and `save` leaves encrypted documents untouched.
        doc.compress();

        let version = EncryptionVersion::V2 {
            document: &*doc,
            owner_password: &protection.owner_password,
            user_password: &protection.user_password,
            key_length: KEY_LENGTH,
            permissions: permissions(protection),
        };
        let state = EncryptionState::try_from(version).context("Failed to set up encryption")?;
        doc.encrypt(&state).context("Failed to encrypt PDF")?;
        Ok(())
    }

    fn unlock(&self, bytes: &[u8], password: &str) -> Result<Document> {
        // lopdf only parses the objects of an encrypted file when the user
        // password is empty. With the Encrypt entry hidden every object is
        // read as stored, then decrypted in place.
        let (hidden, found) = hide_encrypt_key(bytes);
        if !found {
            bail!("PDF is not password protected");
        }
        let mut doc = self.load(&hidden)?;
        let encrypt = doc
            .trailer
            .remove(HIDDEN_ENCRYPT_KEY)
            .context("PDF is not password protected")?;
        doc.trailer.set("Encrypt", encrypt);
        doc.decrypt(password)
            .context("Incorrect password or unsupported encryption")?;
        Ok(doc)
    }
}

fn page_id(doc: &Document, index: usize) -> Result<ObjectId> {
    let pages = doc.get_pages();
    pages.values().nth(index).copied().ok_or_else(|| {
        anyhow!(
            "Page {} is out of range (document has {} pages)",
            index + 1,
            pages.len()
        )
    })
}

fn pages_root(doc: &Document) -> Result<ObjectId> {
    doc.catalog()
        .and_then(|catalog| catalog.get(b"Pages"))
        .and_then(Object::as_reference)
        .context("Document catalog has no page tree")
}

/// Look up `key` on the page or the nearest ancestor that defines it.
fn inherited<'a>(doc: &'a Document, page_id: ObjectId, key: &[u8]) -> Option<&'a Object> {
    let mut current = page_id;
    for _ in 0..MAX_TREE_DEPTH {
        let dict = doc.get_dictionary(current).ok()?;
        if let Ok(value) = dict.get(key) {
            return Some(value);
        }
        current = dict.get(b"Parent").and_then(Object::as_reference).ok()?;
    }
    None
}

fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> &'a Object {
    match obj {
        Object::Reference(id) => doc.get_object(*id).unwrap_or(obj),
        other => other,
    }
}

fn media_box_size(arr: &[Object]) -> Option<PageSize> {
    if arr.len() != 4 {
        return None;
    }
    let llx = arr[0].as_float().ok()?;
    let lly = arr[1].as_float().ok()?;
    let urx = arr[2].as_float().ok()?;
    let ury = arr[3].as_float().ok()?;
    Some(PageSize {
        width: (urx - llx).abs(),
        height: (ury - lly).abs(),
    })
}

/// Copy inherited page attributes onto every page so pages can be moved to a
/// different page tree without losing them.
fn push_down_inherited(doc: &mut Document) -> Result<()> {
    let page_ids: Vec<ObjectId> = doc.get_pages().into_values().collect();
    for page_id in page_ids {
        let mut found = Vec::new();
        for key in INHERITABLE {
            if doc.get_dictionary(page_id)?.has(key) {
                continue;
            }
            if let Some(value) = inherited(doc, page_id, key) {
                found.push((key, value.clone()));
            }
        }
        let page = doc.get_dictionary_mut(page_id)?;
        for (key, value) in found {
            page.set(key, value);
        }
    }
    Ok(())
}

/// A copy of the page's effective resources that can be stored inline on the
/// page without affecting pages that share the original.
fn own_resources(doc: &Document, page_id: ObjectId) -> Result<Dictionary> {
    match inherited(doc, page_id, b"Resources").map(|obj| resolve(doc, obj)) {
        Some(Object::Dictionary(dict)) => Ok(dict.clone()),
        Some(_) => Err(anyhow!("Page resources are not a dictionary")),
        None => Ok(Dictionary::new()),
    }
}

/// Add `id` under a fresh name in the `category` sub-dictionary of
/// `resources` and return the name.
fn register_resource(
    doc: &Document,
    resources: &mut Dictionary,
    category: &[u8],
    prefix: &str,
    id: ObjectId,
) -> Result<Vec<u8>> {
    let mut entries = match resources.get(category).map(|obj| resolve(doc, obj)) {
        Ok(Object::Dictionary(dict)) => dict.clone(),
        Ok(_) => {
            return Err(anyhow!(
                "Page resource {} is not a dictionary",
                String::from_utf8_lossy(category)
            ))
        }
        Err(_) => Dictionary::new(),
    };

    let name = (1..)
        .map(|n| format!("{}{}", prefix, n).into_bytes())
        .find(|name| !entries.has(name))
        .unwrap_or_else(|| prefix.as_bytes().to_vec());
    entries.set(name.clone(), Object::Reference(id));
    resources.set(category, Object::Dictionary(entries));
    Ok(name)
}

/// Wrap the page's existing content streams in `q`/`Q` so graphics state it
/// leaves behind does not leak into content appended after it.
fn isolate_contents(doc: &mut Document, page_id: ObjectId) -> Result<()> {
    let existing: Vec<Object> = match doc.get_dictionary(page_id)?.get(b"Contents") {
        Ok(Object::Reference(id)) => vec![Object::Reference(*id)],
        Ok(Object::Array(streams)) => streams.clone(),
        _ => return Ok(()),
    };
    if existing.is_empty() {
        return Ok(());
    }

    let save = doc.add_object(Stream::new(Dictionary::new(), b"q\n".to_vec()));
    let restore = doc.add_object(Stream::new(Dictionary::new(), b"\nQ\n".to_vec()));
    let mut contents = Vec::with_capacity(existing.len() + 2);
    contents.push(Object::Reference(save));
    contents.extend(existing);
    contents.push(Object::Reference(restore));
    doc.get_dictionary_mut(page_id)?
        .set("Contents", Object::Array(contents));
    Ok(())
}

fn permissions(protection: &Protection) -> Permissions {
    let mut permissions = Permissions::all();
    if !protection.allow_printing {
        permissions.remove(Permissions::PRINTABLE | Permissions::PRINTABLE_IN_HIGH_QUALITY);
    }
    if !protection.allow_copying {
        permissions.remove(Permissions::COPYABLE);
    }
    if !protection.allow_modifying {
        permissions.remove(Permissions::MODIFIABLE | Permissions::ASSEMBLABLE);
    }
    permissions
}

/// The encryption key is derived from the first file identifier, so a
/// document without one gets a fresh identifier before it is protected.
fn ensure_file_id(doc: &mut Document) {
    if doc.trailer.get(b"ID").and_then(Object::as_array).is_ok() {
        return;
    }
    let mut hasher = DefaultHasher::new();
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_nanos())
        .unwrap_or_default()
        .hash(&mut hasher);
    std::process::id().hash(&mut hasher);
    doc.max_id.hash(&mut hasher);
    let high = hasher.finish();
    high.hash(&mut hasher);
    let low = hasher.finish();

    let mut id = high.to_be_bytes().to_vec();
    id.extend(low.to_be_bytes());
    doc.trailer.set(
        "ID",
        Object::Array(vec![
            Object::String(id.clone(), StringFormat::Hexadecimal),
            Object::String(id, StringFormat::Hexadecimal),
        ]),
    );
}

/// Rename every `/Encrypt` name token to `/EncrypT`. The length is kept so
/// cross-reference offsets stay valid.
fn hide_encrypt_key(bytes: &[u8]) -> (Vec<u8>, bool) {
    let mut hidden = bytes.to_vec();
    let mut found = false;
    let mut pos = 0;
    loop {
        let Some(offset) = hidden[pos..]
            .windows(ENCRYPT_KEY.len())
            .position(|window| window == ENCRYPT_KEY)
        else {
            break;
        };
        let end = pos + offset + ENCRYPT_KEY.len();
        if hidden.get(end).map_or(true, |&b| ends_name(b)) {
            hidden[end - 1] = b'T';
            found = true;
        }
        pos = end;
    }
    (hidden, found)
}

fn ends_name(b: u8) -> bool {
    b == 0 || b.is_ascii_whitespace() || b"()<>[]{}/%".contains(&b)
}

/// Encode text for a WinAnsi-encoded standard font. Characters outside
/// Latin-1 are replaced with `?`.
fn win_ansi_bytes(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jpeg::tests::jpeg_header;
    use crate::jpeg::JpegInfo;
    use crate::pdf::backend::{Rgb, StandardFont};
    use crate::pdf::test_support::sample_pdf;

    fn load(pages: u32, prefix: &str) -> Document {
        LopdfBackend.load(&sample_pdf(pages, prefix)).unwrap()
    }

    fn page_text(doc: &Document, index: usize) -> String {
        let id = page_id(doc, index).unwrap();
        String::from_utf8_lossy(&doc.get_page_content(id).unwrap()).into_owned()
    }

    #[test]
    fn test_page_count_and_inherited_size() {
        let doc = load(3, "A");
        assert_eq!(LopdfBackend.page_count(&doc), 3);
        assert_eq!(
            LopdfBackend.page_size(&doc, 1).unwrap(),
            PageSize {
                width: 595.0,
                height: 842.0
            }
        );
        assert!(LopdfBackend.page_size(&doc, 3).is_err());
    }

    #[test]
    fn test_copy_pages_keeps_selected() {
        let doc = load(5, "A");
        let copy = LopdfBackend.copy_pages(&doc, &[0, 2, 4]).unwrap();
        assert_eq!(LopdfBackend.page_count(&copy), 3);
        assert!(page_text(&copy, 1).contains("A-Page-3"));
        assert!(LopdfBackend.copy_pages(&doc, &[5]).is_err());
    }

    #[test]
    fn test_merge_concatenates_in_order() {
        let merged = LopdfBackend
            .merge(vec![load(2, "A"), load(3, "B")])
            .unwrap();
        assert_eq!(LopdfBackend.page_count(&merged), 5);
        assert!(page_text(&merged, 0).contains("A-Page-1"));
        assert!(page_text(&merged, 2).contains("B-Page-1"));
        assert!(page_text(&merged, 4).contains("B-Page-3"));
        // Inherited MediaBox survives the move to the new page tree
        assert_eq!(LopdfBackend.page_size(&merged, 4).unwrap().width, 595.0);

        let mut merged = merged;
        let bytes = LopdfBackend.save(&mut merged).unwrap();
        let reloaded = LopdfBackend.load(&bytes).unwrap();
        assert_eq!(LopdfBackend.page_count(&reloaded), 5);
    }

    #[test]
    fn test_merge_requires_documents() {
        assert!(LopdfBackend.merge(vec![]).is_err());
    }

    #[test]
    fn test_rotation_round_trip() {
        let mut doc = load(2, "A");
        assert_eq!(LopdfBackend.rotation(&doc, 0).unwrap(), 0);
        LopdfBackend.set_rotation(&mut doc, 0, 270).unwrap();
        assert_eq!(LopdfBackend.rotation(&doc, 0).unwrap(), 270);
        assert_eq!(LopdfBackend.rotation(&doc, 1).unwrap(), 0);
    }

    #[test]
    fn test_draw_text_adds_content_and_font() {
        let mut doc = load(1, "A");
        let overlay = TextOverlay {
            text: "Página (1)".into(),
            x: 10.0,
            y: 20.0,
            size: 12.0,
            font: StandardFont::HelveticaBold,
            color: Rgb::gray(0.5),
            opacity: 0.2,
            rotation: 45.0,
        };
        LopdfBackend.draw_text(&mut doc, 0, &overlay).unwrap();

        let content = doc.get_page_content(page_id(&doc, 0).unwrap()).unwrap();
        assert!(content.windows(2).any(|w| w == b"Tj"));

        let id = page_id(&doc, 0).unwrap();
        let resources = own_resources(&doc, id).unwrap();
        let fonts = resources.get(b"Font").unwrap().as_dict().unwrap();
        assert!(fonts.has(b"F1"));
        let font_ref = fonts.get(b"DtF1").unwrap().as_reference().unwrap();
        let font = doc.get_dictionary(font_ref).unwrap();
        assert_eq!(
            font.get(b"BaseFont").unwrap().as_name().unwrap(),
            b"Helvetica-Bold"
        );

        let bytes = LopdfBackend.save(&mut doc).unwrap();
        assert_eq!(LopdfBackend.page_count(&LopdfBackend.load(&bytes).unwrap()), 1);
    }

    fn overlay(text: &str) -> TextOverlay {
        TextOverlay {
            text: text.into(),
            x: 10.0,
            y: 20.0,
            size: 12.0,
            font: StandardFont::Helvetica,
            color: Rgb::gray(0.5),
            opacity: 1.0,
            rotation: 0.0,
        }
    }

    fn operators(doc: &Document, index: usize) -> Vec<String> {
        let id = page_id(doc, index).unwrap();
        let content = Content::decode(&doc.get_page_content(id).unwrap()).unwrap();
        content.operations.into_iter().map(|op| op.operator).collect()
    }

    #[test]
    fn test_draw_text_isolates_unbalanced_page_content() {
        let mut doc = load(1, "A");
        let id = page_id(&doc, 0).unwrap();
        let stream_id = doc.get_page_contents(id)[0];
        doc.get_object_mut(stream_id)
            .unwrap()
            .as_stream_mut()
            .unwrap()
            .set_content(b"1 0 0 -1 0 842 cm".to_vec());

        LopdfBackend.draw_text(&mut doc, 0, &overlay("1")).unwrap();
        let ops = operators(&doc, 0);
        assert_eq!(ops[..4], ["q", "cm", "Q", "q"]);
        assert_eq!(ops.last().map(String::as_str), Some("Q"));
        let saves = ops.iter().filter(|op| *op == "q").count();
        let restores = ops.iter().filter(|op| *op == "Q").count();
        assert_eq!(saves, restores);
    }

    #[test]
    fn test_repeated_draws_stay_balanced() {
        let mut doc = load(1, "A");
        LopdfBackend.draw_text(&mut doc, 0, &overlay("one")).unwrap();
        LopdfBackend.draw_text(&mut doc, 0, &overlay("two")).unwrap();

        let ops = operators(&doc, 0);
        assert_eq!(ops.iter().filter(|op| *op == "Tj").count(), 3);
        let mut depth = 0i32;
        for op in &ops {
            match op.as_str() {
                "q" => depth += 1,
                "Q" => depth -= 1,
                "Tj" if depth == 0 => panic!("text drawn outside a saved state: {ops:?}"),
                _ => {}
            }
            assert!(depth >= 0);
        }
        assert_eq!(depth, 0);
    }

    #[test]
    fn test_draw_text_rejects_non_finite_opacity() {
        let mut doc = load(1, "A");
        let mut bad = overlay("x");
        bad.opacity = f32::NAN;
        assert!(LopdfBackend.draw_text(&mut doc, 0, &bad).is_err());
        assert_eq!(operators(&doc, 0), ["BT", "Tf", "Td", "Tj", "ET"]);
    }

    #[test]
    fn test_image_document_embeds_jpeg_bytes() {
        let wide = jpeg_header(640, 480, 3);
        let gray = jpeg_header(100, 200, 1);
        let pages: Vec<ImagePage> = [&wide, &gray]
            .into_iter()
            .map(|data| {
                let info = JpegInfo::parse(data).unwrap();
                let (width, height) = (info.width as f32, info.height as f32);
                ImagePage {
                    data,
                    info,
                    page: PageSize { width, height },
                    x: 0.0,
                    y: 0.0,
                    width,
                    height,
                }
            })
            .collect();

        let mut doc = LopdfBackend.image_document(&pages).unwrap();
        assert_eq!(LopdfBackend.page_count(&doc), 2);
        assert_eq!(
            LopdfBackend.page_size(&doc, 1).unwrap(),
            PageSize {
                width: 100.0,
                height: 200.0
            }
        );
        assert_eq!(operators(&doc, 0), ["q", "cm", "Do", "Q"]);

        let id = page_id(&doc, 1).unwrap();
        let resources = own_resources(&doc, id).unwrap();
        let images = resources.get(b"XObject").unwrap().as_dict().unwrap();
        let image_id = images.get(b"Im1").unwrap().as_reference().unwrap();
        let image = doc.get_object(image_id).unwrap().as_stream().unwrap();
        assert_eq!(image.dict.get(b"Filter").unwrap().as_name().unwrap(), b"DCTDecode");
        assert_eq!(image.dict.get(b"ColorSpace").unwrap().as_name().unwrap(), b"DeviceGray");
        assert_eq!(image.content, gray);

        let bytes = LopdfBackend.save(&mut doc).unwrap();
        assert_eq!(LopdfBackend.page_count(&LopdfBackend.load(&bytes).unwrap()), 2);
        assert!(LopdfBackend.image_document(&[]).is_err());
    }

    #[test]
    fn test_protect_then_unlock() {
        let mut doc = load(2, "A");
        let mut protection = Protection::new("secret");
        protection.owner_password = "owner".into();
        LopdfBackend.protect(&mut doc, &protection).unwrap();
        assert!(LopdfBackend.is_protected(&doc));
        assert!(LopdfBackend.protect(&mut doc, &protection).is_err());

        let bytes = LopdfBackend.save(&mut doc).unwrap();
        assert!(bytes.windows(ENCRYPT_KEY.len()).any(|w| w == ENCRYPT_KEY));

        assert!(LopdfBackend.unlock(&bytes, "wrong").is_err());
        let mut unlocked = LopdfBackend.unlock(&bytes, "secret").unwrap();
        assert!(!LopdfBackend.is_protected(&unlocked));
        assert_eq!(LopdfBackend.page_count(&unlocked), 2);
        assert!(page_text(&unlocked, 1).contains("A-Page-2"));

        let saved = LopdfBackend.save(&mut unlocked).unwrap();
        let reloaded = LopdfBackend.load(&saved).unwrap();
        assert!(!reloaded.is_encrypted());
        assert!(page_text(&reloaded, 0).contains("A-Page-1"));
    }

    #[test]
    fn test_unlock_requires_protected_input() {
        let err = LopdfBackend.unlock(&sample_pdf(1, "A"), "secret").unwrap_err();
        assert!(err.to_string().contains("not password protected"));
    }

    #[test]
    fn test_permissions_follow_protection() {
        let denied = permissions(&Protection::new("pw"));
        assert!(!denied.contains(Permissions::PRINTABLE));
        assert!(!denied.contains(Permissions::COPYABLE));
        assert!(!denied.contains(Permissions::MODIFIABLE));
        assert!(denied.contains(Permissions::COPYABLE_FOR_ACCESSIBILITY));

        let mut open = Protection::new("pw");
        open.allow_printing = true;
        let permissions = permissions(&open);
        assert!(permissions.contains(Permissions::PRINTABLE));
        assert!(!permissions.contains(Permissions::COPYABLE));
    }

    #[test]
    fn test_hide_encrypt_key_skips_longer_names() {
        let (hidden, found) = hide_encrypt_key(b"<</Encrypt 5 0 R/EncryptMetadata false>>/Encrypt");
        assert!(found);
        assert_eq!(
            hidden,
            b"<</EncrypT 5 0 R/EncryptMetadata false>>/EncrypT".to_vec()
        );
        assert!(!hide_encrypt_key(b"<</EncryptMetadata true>>").1);
    }

    #[test]
    fn test_remove_page() {
        let mut doc = load(3, "A");
        LopdfBackend.remove_page(&mut doc, 2).unwrap();
        assert_eq!(LopdfBackend.page_count(&doc), 2);
        assert!(page_text(&doc, 1).contains("A-Page-2"));
        assert!(LopdfBackend.remove_page(&mut doc, 5).is_err());
    }

    #[test]
    fn test_open_and_write_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("in.pdf");
        std::fs::write(&path, sample_pdf(2, "A")).unwrap();

        let mut doc = LopdfBackend.open(&path).unwrap();
        let out = dir.path().join("out.pdf");
        LopdfBackend.write(&mut doc, &out).unwrap();
        assert_eq!(LopdfBackend.page_count(&LopdfBackend.open(&out).unwrap()), 2);

        assert!(LopdfBackend.open(dir.path().join("missing.pdf")).is_err());
    }

    #[test]
    fn test_win_ansi_bytes() {
        assert_eq!(win_ansi_bytes("aé✓"), vec![b'a', 0xE9, b'?']);
    }
}
