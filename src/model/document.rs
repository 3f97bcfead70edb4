use serde_json::{Map, Number, Value};

use super::{
    Color, ExportOptions, Gradient, Layer, LayerListExpandedType, Rect, RulerData, Style, tagged,
};

record! {
    /// The package's `document.json`: document-wide settings, shared
    /// styles and references to the page files.
    pub struct Document {
        #[serde(rename = "_class")]
        class: String,
        #[serde(rename = "do_objectID")]
        object_id: String,
        assets: AssetCollection,
        current_page_index: Number,
        enable_layer_interaction: bool,
        enable_slice_interaction: bool,
        foreign_symbols: Vec<Value>,
        layer_styles: SharedStyleContainer,
        layer_symbols: SharedSymbolContainer,
        layer_text_styles: SharedTextStyleContainer,
        pages: Vec<FileReference>,
    }
}

record! {
    /// One `pages/<id>.json` document.
    pub struct Page {
        #[serde(rename = "_class")]
        class: String,
        #[serde(rename = "do_objectID")]
        object_id: String,
        export_options: ExportOptions,
        frame: Rect,
        has_click_through: bool,
        horizontal_ruler_data: RulerData,
        include_in_cloud_upload: bool,
        is_flipped_horizontal: bool,
        is_flipped_vertical: bool,
        is_locked: bool,
        is_visible: bool,
        layer_list_expanded_type: Number,
        layers: Vec<Layer>,
        name: String,
        name_is_fixed: bool,
        resizing_type: Number,
        rotation: Number,
        should_break_mask_chain: bool,
        style: Style,
        vertical_ruler_data: RulerData,
    }
}

impl Page {
    /// Top-level layers, usually artboards.
    pub fn layers(&self) -> &[Layer] {
        self.layers.as_deref().unwrap_or_default()
    }

    /// Number of layers on the page, nested ones included.
    pub fn layer_count(&self) -> usize {
        let mut count = 0;
        for layer in self.layers() {
            layer.walk(&mut |_, _| count += 1);
        }
        count
    }

    pub fn list_expanded(&self) -> Option<LayerListExpandedType> {
        tagged(&self.layer_list_expanded_type, LayerListExpandedType::from_i64)
    }
}

record! {
    /// The package's `meta.json`: which app wrote it and what it contains.
    pub struct Meta {
        commit: String,
        app_version: String,
        build: Number,
        app: String,
        pages_and_artboards: Map<String, Value>,
        fonts: Vec<String>,
        version: Number,
        save_history: Vec<String>,
        autosaved: Number,
        variant: String,
    }
}

record! {
    /// Reference from one package document to another file in the package.
    pub struct FileReference {
        #[serde(rename = "_class")]
        class: String,
        #[serde(rename = "_ref")]
        reference: String,
        #[serde(rename = "_ref_class")]
        ref_class: String,
        data: DataString,
        sha1: DataString,
    }
}

impl FileReference {
    /// Package entry name this reference points at, e.g. `pages/<id>.json`.
    ///
    /// Page references omit the extension; image references carry theirs.
    pub fn entry_name(&self) -> Option<String> {
        let reference = self.reference.as_deref()?;
        if reference.contains('.') {
            Some(reference.to_owned())
        } else {
            Some(format!("{}.json", reference))
        }
    }
}

record! {
    pub struct DataString {
        #[serde(rename = "_data")]
        data: String,
    }
}

record! {
    pub struct AssetCollection {
        #[serde(rename = "_class")]
        class: String,
        colors: Vec<Color>,
        gradients: Vec<Gradient>,
        image_collection: ImageCollection,
        images: Vec<FileReference>,
    }
}

record! {
    pub struct ImageCollection {
        #[serde(rename = "_class")]
        class: String,
        images: Map<String, Value>,
    }
}

record! {
    /// A named style shared between layers.
    pub struct SharedStyle {
        #[serde(rename = "_class")]
        class: String,
        #[serde(rename = "do_objectID")]
        object_id: String,
        name: String,
        value: Style,
    }
}

record! {
    pub struct SharedStyleContainer {
        #[serde(rename = "_class")]
        class: String,
        objects: Vec<SharedStyle>,
    }
}

record! {
    pub struct SharedTextStyleContainer {
        #[serde(rename = "_class")]
        class: String,
        objects: Vec<SharedStyle>,
    }
}

record! {
    /// Symbol masters live on their own page; this container is kept only
    /// for older files and stays uninterpreted.
    pub struct SharedSymbolContainer {
        #[serde(rename = "_class")]
        class: String,
        objects: Vec<Value>,
    }
}
