//! Static tables driving admission, classification and name filtering.
//!
//! Extend these lists to tune the scanner; the extraction logic only reads
//! them.

/// Node.js core modules. Never third-party packages.
pub const BUILTIN_MODULES: &[&str] = &[
    "assert",
    "async_hooks",
    "buffer",
    "child_process",
    "cluster",
    "console",
    "constants",
    "crypto",
    "dgram",
    "diagnostics_channel",
    "dns",
    "domain",
    "events",
    "fs",
    "http",
    "http2",
    "https",
    "inspector",
    "module",
    "net",
    "os",
    "path",
    "perf_hooks",
    "process",
    "punycode",
    "querystring",
    "readline",
    "repl",
    "stream",
    "string_decoder",
    "sys",
    "timers",
    "tls",
    "trace_events",
    "tty",
    "url",
    "util",
    "v8",
    "vm",
    "wasi",
    "worker_threads",
    "zlib",
];

/// Tokens that show up where package names are expected but never are one.
/// Compared case-insensitively.
pub const NON_PACKAGE_TOKENS: &[&str] = &[
    "name",
    "version",
    "main",
    "test",
    "start",
    "build",
    "dev",
    "prod",
    "src",
    "dist",
    "lib",
    "bin",
    "scripts",
    "config",
    "index",
    "node_modules",
    "commonjs",
    "commonjs2",
    "amd",
    "root",
    "umd",
    "true",
    "false",
    "null",
    "undefined",
];

/// Words that end an install command written in prose.
pub const PROSE_STOPWORDS: &[&str] = &[
    "and", "or", "to", "the", "then", "with", "for", "in", "into", "if", "from", "as", "run",
];

/// Properties assigned on `window`/`global` that are not library globals.
pub const GLOBAL_PROPERTIES: &[&str] = &[
    "onload",
    "onerror",
    "onunload",
    "onbeforeunload",
    "onresize",
    "onscroll",
    "onmessage",
    "onpopstate",
    "onhashchange",
    "location",
    "name",
    "status",
    "opener",
    "document",
    "console",
    "datalayer",
    "performance",
];

/// Makefile macros substituted with the command they stand for.
pub const MAKE_MACROS: &[(&str, &str)] = &[("$(NPM)", "npm"), ("$(YARN)", "yarn"), ("$(NPX)", "npx")];

/// Filenames that identify JSON manifests and lockfiles.
pub const JSON_MARKERS: &[&str] = &["package.json", "package-lock.json", "yarn.lock"];

/// Build, lint and type-checker configuration basenames.
pub const CONFIG_MARKERS: &[&str] = &[
    "webpack.config",
    "rollup.config",
    "vite.config",
    "babel.config",
    "jest.config",
    "prettier.config",
    "eslint",
    ".babelrc",
    ".prettierrc",
    "tsconfig.json",
    "jsconfig.json",
    ".eslintrc",
    ".stylelintrc",
];

/// Path fragments that identify CI/CD and container build scripts.
pub const CICD_MARKERS: &[&str] = &[
    ".github/workflows",
    ".gitlab-ci",
    "dockerfile",
    "docker-compose",
    ".travis",
    ".circleci",
    "makefile",
];

/// Shell and YAML extensions treated as CI/CD scripts.
pub const CICD_EXTENSIONS: &[&str] = &[".yml", ".yaml", ".sh", ".bash"];

/// Documentation extensions.
pub const DOC_EXTENSIONS: &[&str] = &[".md", ".rst", ".txt"];

/// Source map extensions.
pub const SOURCEMAP_EXTENSIONS: &[&str] = &[".map"];

/// Extensions worth fetching even when they collide with the exclusion list.
pub const RELEVANT_EXTENSIONS: &[&str] = &[
    "js", "mjs", "cjs", "jsx", "ts", "tsx", "json", "lock", "map", "md", "rst", "txt", "yml",
    "yaml", "sh", "bash", "html", "htm", "xhtml", "php", "asp", "aspx", "jsp", "vue", "svelte",
];

/// Media, archive, binary and font extensions that are never scanned.
pub const EXCLUDED_EXTENSIONS: &[&str] = &[
    // images
    "jpg", "jpeg", "png", "gif", "bmp", "tiff", "tif", "webp", "svg", "ico", "cur", "psd", "ai",
    "eps", "raw", "cr2", "nef", "orf", "sr2", "dng",
    // video
    "mp4", "avi", "mov", "wmv", "flv", "webm", "mkv", "m4v", "3gp", "ogv", "mpg", "mpeg", "m2v",
    "m4p", "m4b", "f4v", "f4p", "f4a", "f4b",
    // audio
    "mp3", "wav", "flac", "aac", "ogg", "wma", "m4a", "opus", "amr", "aiff", "au", "ra", "3ga",
    "ac3", "ape", "caf", "dts", "m4r", "mka", "tak", "tta", "wv",
    // archives
    "zip", "rar", "7z", "tar", "gz", "bz2", "xz", "lz", "lzma", "z", "cab", "arj", "lha", "ace",
    "zoo", "arc", "pak", "pit", "sit", "sitx", "sea", "hqx",
    // documents
    "pdf", "doc", "docx", "xls", "xlsx", "ppt", "pptx", "odt", "ods", "odp", "rtf", "pages",
    "numbers", "key",
    // executables
    "exe", "msi", "deb", "rpm", "dmg", "pkg", "app", "run", "bin", "com", "scr", "bat", "cmd",
    "ps1", "vbs", "jar", "war", "ear",
    // fonts
    "ttf", "otf", "woff", "woff2", "eot", "fon", "fnt",
    // databases and disk images
    "db", "sqlite", "sqlite3", "mdb", "accdb", "dbf", "iso", "img", "vdi", "vmdk", "vhd",
    // native objects
    "dll", "so", "dylib", "lib", "a", "o", "obj", "swf", "fla", "as", "class",
];
