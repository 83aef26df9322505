use super::{SamplerDesc, Texture, TextureFilter, TextureLifecycler, TextureLoader, TextureWrap};
use crate::ResourcesConfig;
use egui::Ui;
use nab_kiln::{TomlRead, TomlWrite};
use resource_kiln::{resource, BoxedError, ResourceLifecycler, ResourceManager, ResourceTypeTag};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

pub const FALLBACK_CHAR: char = '?';

/// A glyph's rectangle on the page, in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Glyph
{
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub x_offset: i32,
    #[serde(default)]
    pub y_offset: i32,
    pub advance: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FontGlyphEntry
{
    #[serde(rename = "char")]
    pub character: char,
    #[serde(flatten)]
    pub glyph: Glyph,
}

/// Font descriptor, stored as TOML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FontFile
{
    /// Texture holding the glyphs
    pub page: String,
    /// If set, the page texture is created from this image when it doesn't exist yet
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_image: Option<String>,
    pub line_height: u32,
    /// Distance from the top of a line to the baseline
    pub base: u32,
    #[serde(default)]
    pub glyphs: Vec<FontGlyphEntry>,
}
impl TomlRead for FontFile { }
impl TomlWrite for FontFile { }

#[derive(Debug)]
pub enum FontError
{
    InvalidMetrics { line_height: u32, base: u32 },
    GlyphOutsidePage { character: char, page_width: u32, page_height: u32 },
    DuplicateGlyph(char),
    EmptyGridCell,
    InvalidCharacter(u32),
}
impl Display for FontError
{
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result
    {
        match self
        {
            FontError::InvalidMetrics { line_height, base } => write!(f, "Invalid line metrics (line height {line_height}, base {base})"),
            FontError::GlyphOutsidePage { character, page_width, page_height } =>
                write!(f, "Glyph {character:?} does not fit inside the {page_width}x{page_height} page"),
            FontError::DuplicateGlyph(character) => write!(f, "Glyph {character:?} is defined more than once"),
            _ => Debug::fmt(self, f),
        }
    }
}
impl Error for FontError { }

#[resource(tag = ResourceTypeTag::BITMAP_FONT)]
#[derive(Debug)]
pub struct BitmapFont
{
    name: String,
    pub page: Arc<Texture>,
    pub line_height: u32,
    pub base: u32,
    pub glyphs: HashMap<char, Glyph>,
}
impl BitmapFont
{
    /// Falls back to [`FALLBACK_CHAR`] for unmapped characters, or nothing if that's missing too
    #[must_use]
    pub fn glyph(&self, character: char) -> Option<&Glyph>
    {
        self.glyphs.get(&character).or_else(|| self.glyphs.get(&FALLBACK_CHAR))
    }

    /// Pixel size of `text` laid out with this font, lines split on '\n'
    #[must_use]
    pub fn measure(&self, text: &str) -> (u32, u32)
    {
        let mut widest = 0;
        let mut lines = 0;
        for line in text.split('\n')
        {
            let width: u32 = line.chars().filter_map(|c| self.glyph(c)).map(|g| g.advance).sum();
            widest = widest.max(width);
            lines += 1;
        }
        (widest, lines * self.line_height)
    }
}

#[derive(Debug, Clone)]
pub enum BitmapFontLoader
{
    Toml(String),
    /// TOML file relative to the resources root
    File(PathBuf),
    Desc(FontFile),
    /// Fixed-size cells laid out left to right, top to bottom, starting at `first_char`
    Grid
    {
        page: String,
        cell_width: u32,
        cell_height: u32,
        first_char: char,
        glyph_count: u32,
    },
}

fn grid_glyphs(page: &Texture, cell_width: u32, cell_height: u32, first_char: char, glyph_count: u32) -> Result<Vec<FontGlyphEntry>, FontError>
{
    if cell_width == 0 || cell_height == 0 || glyph_count == 0
    {
        return Err(FontError::EmptyGridCell);
    }

    let (page_width, page_height) = (page.width(), page.height());
    let columns = (page_width / cell_width).max(1);
    (0..glyph_count).map(|i|
    {
        let code = (first_char as u32).saturating_add(i);
        let character = char::from_u32(code).ok_or(FontError::InvalidCharacter(code))?;

        // checked, large grids would otherwise wrap back onto the page
        let x = (i % columns).checked_mul(cell_width).filter(|x| x.checked_add(cell_width).is_some_and(|r| r <= page_width));
        let y = (i / columns).checked_mul(cell_height).filter(|y| y.checked_add(cell_height).is_some_and(|b| b <= page_height));
        let (Some(x), Some(y)) = (x, y)
            else { return Err(FontError::GlyphOutsidePage { character, page_width, page_height }); };

        Ok(FontGlyphEntry
        {
            character,
            glyph: Glyph
            {
                x,
                y,
                width: cell_width,
                height: cell_height,
                x_offset: 0,
                y_offset: 0,
                advance: cell_width,
            },
        })
    }).collect()
}

fn build_glyph_map(page: &Texture, entries: Vec<FontGlyphEntry>) -> Result<HashMap<char, Glyph>, FontError>
{
    let (page_width, page_height) = (page.width(), page.height());
    let mut glyphs = HashMap::with_capacity(entries.len());
    for FontGlyphEntry { character, glyph } in entries
    {
        let fits = glyph.x.checked_add(glyph.width).is_some_and(|right| right <= page_width)
            && glyph.y.checked_add(glyph.height).is_some_and(|bottom| bottom <= page_height);
        if !fits
        {
            return Err(FontError::GlyphOutsidePage { character, page_width, page_height });
        }
        if glyphs.insert(character, glyph).is_some()
        {
            return Err(FontError::DuplicateGlyph(character));
        }
    }
    Ok(glyphs)
}

pub struct BitmapFontLifecycler
{
    config: Arc<ResourcesConfig>,
    textures: Arc<ResourceManager<TextureLifecycler>>,
    live_glyphs: AtomicUsize,
}
impl BitmapFontLifecycler
{
    #[must_use]
    pub fn new(config: Arc<ResourcesConfig>, textures: Arc<ResourceManager<TextureLifecycler>>) -> Self
    {
        Self { config, textures, live_glyphs: AtomicUsize::new(0) }
    }

    #[inline] #[must_use]
    pub fn textures(&self) -> &Arc<ResourceManager<TextureLifecycler>> { &self.textures }

    #[inline] #[must_use]
    pub fn live_glyphs(&self) -> usize { self.live_glyphs.load(Ordering::Relaxed) }

    /// The page texture, and whether this call created it
    fn page_texture(&self, page: &str, page_image: Option<&str>) -> Result<(Arc<Texture>, bool), BoxedError>
    {
        let texture = match page_image
        {
            // glyphs are sampled texel-exact
            Some(image) => self.textures.create_or_get(page, &TextureLoader::FromImage
            {
                image: image.to_string(),
                sampler: SamplerDesc { filter: TextureFilter::Nearest, wrap: TextureWrap::Clamp },
                generate_mips: false,
            })?,
            None => (self.textures.get(page)?, false),
        };
        Ok(texture)
    }
}
impl ResourceLifecycler for BitmapFontLifecycler
{
    type Resource = BitmapFont;
    type Loader = BitmapFontLoader;

    fn create_impl(&self, name: &str, loader: &BitmapFontLoader) -> Result<BitmapFont, BoxedError>
    {
        let font_file = match loader
        {
            BitmapFontLoader::Toml(text) => FontFile::from_toml_str(text)?,
            BitmapFontLoader::File(path) => FontFile::load_file(self.config.resolve_path(path))?,
            BitmapFontLoader::Desc(desc) => desc.clone(),
            BitmapFontLoader::Grid { page, cell_width, cell_height, first_char, glyph_count } =>
            {
                let texture = self.textures.get(page)?;
                FontFile
                {
                    page: page.clone(),
                    page_image: None,
                    line_height: *cell_height,
                    base: *cell_height,
                    glyphs: grid_glyphs(&texture, *cell_width, *cell_height, *first_char, *glyph_count)?,
                }
            },
        };

        if font_file.line_height == 0 || font_file.base > font_file.line_height
        {
            return Err(Box::new(FontError::InvalidMetrics { line_height: font_file.line_height, base: font_file.base }));
        }

        let (page, created_page) = self.page_texture(&font_file.page, font_file.page_image.as_deref())?;
        let glyphs = match build_glyph_map(&page, font_file.glyphs)
        {
            Ok(glyphs) => glyphs,
            Err(err) =>
            {
                if created_page { self.textures.release_instance(&font_file.page, &page); }
                return Err(Box::new(err));
            }
        };

        self.live_glyphs.fetch_add(glyphs.len(), Ordering::Relaxed);
        Ok(BitmapFont
        {
            name: name.to_string(),
            page,
            line_height: font_file.line_height,
            base: font_file.base,
            glyphs,
        })
    }

    fn free_impl(&self, resource: Arc<BitmapFont>)
    {
        self.live_glyphs.fetch_sub(resource.glyphs.len(), Ordering::Relaxed);
    }

    fn debug_gui(&self, ui: &mut Ui)
    {
        ui.label(format!("Glyphs: {}", self.live_glyphs()));
    }
}
