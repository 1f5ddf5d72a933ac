use phf::phf_map;

/// 支持上传的文件类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    Pdf,
    PlainText,
    Jpeg,
    Png,
}

/// content-type → 文件类型
static CONTENT_TYPES: phf::Map<&'static str, SourceKind> = phf_map! {
    "application/pdf" => SourceKind::Pdf,
    "text/plain" => SourceKind::PlainText,
    "image/jpeg" => SourceKind::Jpeg,
    "image/jpg" => SourceKind::Jpeg,
    "image/png" => SourceKind::Png,
};

impl SourceKind {
    /// 根据 content-type 解析，忽略 `; charset=...` 之类的参数
    pub fn from_content_type(content_type: &str) -> Option<Self> {
        let essence = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        CONTENT_TYPES.get(essence.as_str()).copied()
    }

    /// 标准 MIME 类型（发送给 AI 服务和存储）
    pub fn mime_type(self) -> &'static str {
        match self {
            SourceKind::Pdf => "application/pdf",
            SourceKind::PlainText => "text/plain",
            SourceKind::Jpeg => "image/jpeg",
            SourceKind::Png => "image/png",
        }
    }

    /// 临时文件后缀
    pub fn extension(self) -> &'static str {
        match self {
            SourceKind::Pdf => ".pdf",
            SourceKind::PlainText => ".txt",
            SourceKind::Jpeg => ".jpg",
            SourceKind::Png => ".png",
        }
    }
}
