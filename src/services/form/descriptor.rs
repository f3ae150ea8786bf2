//! Model descriptors
//!
//! Static metadata describing every model the form engine can render:
//! field order, widget kind, constraints and dependent fields.

/// How a field is edited and how its value is represented
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Single line string
    Text,
    /// Multi line string
    TextArea,
    /// Boolean
    Checkbox,
    /// UTC timestamp
    DateTime,
    /// `BlogType` ordinal
    Enum,
    /// Id of another model, named by its descriptor name
    Reference(&'static str),
}

impl FieldKind {
    /// Widget type sent to the form client
    pub fn widget(&self) -> &'static str {
        match self {
            FieldKind::Text => "text",
            FieldKind::TextArea => "textarea",
            FieldKind::Checkbox => "checkbox",
            FieldKind::DateTime => "datetime",
            FieldKind::Enum | FieldKind::Reference(_) => "select",
        }
    }
}

/// One field of a model
#[derive(Debug, Clone, Copy)]
pub struct FieldDescriptor {
    pub name: &'static str,
    pub label: &'static str,
    pub advice: &'static str,
    pub kind: FieldKind,
    pub data_type: &'static str,
    /// Value must be present
    pub required: bool,
    /// String value must contain a non-whitespace character
    pub not_blank: bool,
    pub max_length: Option<usize>,
    /// Fields whose choices depend on this field's value
    pub dependents: &'static [&'static str],
}

impl FieldDescriptor {
    const fn new(name: &'static str, label: &'static str, kind: FieldKind, data_type: &'static str) -> Self {
        Self {
            name,
            label,
            advice: "",
            kind,
            data_type,
            required: false,
            not_blank: false,
            max_length: None,
            dependents: &[],
        }
    }

    const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    const fn not_blank(mut self) -> Self {
        self.required = true;
        self.not_blank = true;
        self
    }

    const fn max_length(mut self, max: usize) -> Self {
        self.max_length = Some(max);
        self
    }

    const fn advice(mut self, advice: &'static str) -> Self {
        self.advice = advice;
        self
    }

    const fn dependents(mut self, dependents: &'static [&'static str]) -> Self {
        self.dependents = dependents;
        self
    }
}

/// Which entity a descriptor maps to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelKind {
    Blog,
    BlogSubtype,
    Post,
}

/// Form metadata for one model
#[derive(Debug)]
pub struct ModelDescriptor {
    pub kind: ModelKind,
    /// Canonical lower case name used in URLs
    pub name: &'static str,
    pub display_name: &'static str,
    pub fields: &'static [FieldDescriptor],
}

impl ModelDescriptor {
    pub fn field(&self, name: &str) -> Option<&'static FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn field_names(&self) -> Vec<String> {
        self.fields.iter().map(|f| f.name.to_string()).collect()
    }

    /// Field shown as the text of a reference choice
    pub fn title_field(&self) -> &'static str {
        match self.kind {
            ModelKind::Blog => "handle",
            ModelKind::BlogSubtype => "name",
            ModelKind::Post => "title",
        }
    }
}

pub static BLOG: ModelDescriptor = ModelDescriptor {
    kind: ModelKind::Blog,
    name: "blog",
    display_name: "Blog",
    fields: &[
        FieldDescriptor::new("handle", "Handle", FieldKind::Text, "String")
            .not_blank()
            .max_length(64)
            .advice("Short unique name of the blog"),
        FieldDescriptor::new("description", "Description", FieldKind::TextArea, "String")
            .max_length(512),
        FieldDescriptor::new("type", "Type", FieldKind::Enum, "BlogType")
            .required()
            .dependents(&["subtype"]),
        FieldDescriptor::new("subtype", "Subtype", FieldKind::Reference("blogsubtype"), "BlogSubtype")
            .advice("Choose a type first"),
        FieldDescriptor::new("enabled", "Enabled", FieldKind::Checkbox, "Boolean").required(),
        FieldDescriptor::new("image", "Image", FieldKind::Text, "String")
            .max_length(255)
            .advice("Image URL"),
        FieldDescriptor::new("timeCreated", "Time created", FieldKind::DateTime, "Date").required(),
    ],
};

pub static BLOG_SUBTYPE: ModelDescriptor = ModelDescriptor {
    kind: ModelKind::BlogSubtype,
    name: "blogsubtype",
    display_name: "Blog subtype",
    fields: &[
        FieldDescriptor::new("name", "Name", FieldKind::Text, "String")
            .required()
            .max_length(128),
        FieldDescriptor::new("type", "Type", FieldKind::Enum, "BlogType").required(),
    ],
};

pub static POST: ModelDescriptor = ModelDescriptor {
    kind: ModelKind::Post,
    name: "post",
    display_name: "Post",
    fields: &[
        FieldDescriptor::new("blog", "Blog", FieldKind::Reference("blog"), "Blog").required(),
        FieldDescriptor::new("title", "Title", FieldKind::Text, "String")
            .not_blank()
            .max_length(128),
        FieldDescriptor::new("content", "Content", FieldKind::TextArea, "String").max_length(4096),
        FieldDescriptor::new("timeCreated", "Time created", FieldKind::DateTime, "Date").required(),
    ],
};

pub static MODELS: &[&ModelDescriptor] = &[&BLOG, &BLOG_SUBTYPE, &POST];

/// Look up a model by name, ignoring case, `_` and `-`
/// (`Blog`, `blog_subtype` and `blog-subtype` all resolve).
pub fn find_model(name: &str) -> Option<&'static ModelDescriptor> {
    let normalized: String = name
        .chars()
        .filter(|c| *c != '_' && *c != '-')
        .collect::<String>()
        .to_lowercase();
    MODELS.iter().copied().find(|m| m.name == normalized)
}
