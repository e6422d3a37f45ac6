use std::{collections::HashSet, fmt, str::FromStr};

use serde::{Deserialize, Serialize, Serializer};
use strum::{AsRefStr, EnumIter, IntoStaticStr, ParseError, VariantArray, VariantNames};

/// Describes the modules that should be installed.
///
/// # Example
///
/// Create a [`RpcModuleSelection`] from a selection.
///
/// ```
/// use pocc_rpc_builder::{PoccRpcModule, RpcModuleSelection};
/// let config: RpcModuleSelection = vec![PoccRpcModule::Pocc].into();
/// ```
#[derive(Debug, Default, Clone, Eq, PartialEq)]
pub enum RpcModuleSelection {
    /// Use _all_ available modules.
    All,
    /// The public modules `pocc`, `txpool`, `debug` and `rpc`.
    ///
    /// Services marked non-public are never installed through this selection.
    #[default]
    Standard,
    /// Only use the configured modules.
    Selection(HashSet<PoccRpcModule>),
}

// === impl RpcModuleSelection ===

impl RpcModuleSelection {
    /// The standard modules to instantiate by default.
    pub const STANDARD_MODULES: [PoccRpcModule; 4] =
        [PoccRpcModule::Pocc, PoccRpcModule::Txpool, PoccRpcModule::Debug, PoccRpcModule::Rpc];

    /// Returns a selection of all [`PoccRpcModule`]s.
    pub fn all_modules() -> HashSet<PoccRpcModule> {
        PoccRpcModule::modules().into_iter().collect()
    }

    /// Returns the [`RpcModuleSelection::STANDARD_MODULES`] as a selection.
    pub fn standard_modules() -> HashSet<PoccRpcModule> {
        HashSet::from(Self::STANDARD_MODULES)
    }

    /// Creates a new _unique_ [`RpcModuleSelection::Selection`] from the given items.
    ///
    /// # Example
    ///
    /// ```
    /// use pocc_rpc_builder::{PoccRpcModule, RpcModuleSelection};
    /// let selection = vec!["pocc", "personal", "pocc"];
    /// let config = RpcModuleSelection::try_from_selection(selection).unwrap();
    /// assert_eq!(config, RpcModuleSelection::from([PoccRpcModule::Pocc, PoccRpcModule::Personal]));
    /// ```
    pub fn try_from_selection<I, T>(selection: I) -> Result<Self, T::Error>
    where
        I: IntoIterator<Item = T>,
        T: TryInto<PoccRpcModule>,
    {
        selection.into_iter().map(TryInto::try_into).collect()
    }

    /// Returns the number of modules in the selection
    pub fn len(&self) -> usize {
        match self {
            Self::All => PoccRpcModule::variant_count(),
            Self::Standard => Self::STANDARD_MODULES.len(),
            Self::Selection(s) => s.len(),
        }
    }

    /// Returns true if no selection is configured
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Selection(sel) => sel.is_empty(),
            _ => false,
        }
    }

    /// Returns true if the module is part of the selection.
    pub fn contains(&self, module: &PoccRpcModule) -> bool {
        match self {
            Self::All => true,
            Self::Standard => Self::STANDARD_MODULES.contains(module),
            Self::Selection(s) => s.contains(module),
        }
    }

    /// Returns true if a service of `module` with the given visibility gets installed.
    ///
    /// Non-public services require their module to be named by the selection.
    pub fn installs(&self, module: &PoccRpcModule, public: bool) -> bool {
        match self {
            Self::Standard => public && self.contains(module),
            _ => self.contains(module),
        }
    }

    /// Returns an iterator over all configured [`PoccRpcModule`]
    pub fn iter_selection(&self) -> Box<dyn Iterator<Item = PoccRpcModule> + '_> {
        match self {
            Self::All => Box::new(PoccRpcModule::modules().into_iter()),
            Self::Standard => Box::new(Self::STANDARD_MODULES.iter().copied()),
            Self::Selection(s) => Box::new(s.iter().copied()),
        }
    }

    /// Converts the selection into a [`HashSet`].
    pub fn into_selection(self) -> HashSet<PoccRpcModule> {
        match self {
            Self::All => Self::all_modules(),
            Self::Standard => Self::standard_modules(),
            Self::Selection(s) => s,
        }
    }

    /// Returns true if both selections install the same services.
    pub fn are_identical(http: Option<&Self>, ws: Option<&Self>) -> bool {
        match (http, ws) {
            (Some(Self::Standard), Some(Self::Standard)) | (None, None) => true,
            // standard drops the non-public services a named selection would install
            (Some(Self::Standard), Some(_)) | (Some(_), Some(Self::Standard)) => false,
            (Some(http), Some(ws)) => http.clone().into_selection() == ws.clone().into_selection(),
            (Some(some), None) | (None, Some(some)) => some.is_empty(),
        }
    }
}

impl From<HashSet<PoccRpcModule>> for RpcModuleSelection {
    fn from(s: HashSet<PoccRpcModule>) -> Self {
        Self::Selection(s)
    }
}

impl From<Vec<PoccRpcModule>> for RpcModuleSelection {
    fn from(s: Vec<PoccRpcModule>) -> Self {
        Self::Selection(s.into_iter().collect())
    }
}

impl<const N: usize> From<[PoccRpcModule; N]> for RpcModuleSelection {
    fn from(s: [PoccRpcModule; N]) -> Self {
        Self::Selection(s.iter().copied().collect())
    }
}

impl FromIterator<PoccRpcModule> for RpcModuleSelection {
    fn from_iter<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = PoccRpcModule>,
    {
        Self::Selection(iter.into_iter().collect())
    }
}

impl FromStr for RpcModuleSelection {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Ok(Self::Selection(Default::default()))
        }
        let mut modules = s.split(',').map(str::trim).peekable();
        let first = modules.peek().copied().ok_or(ParseError::VariantNotFound)?;
        match first {
            "all" | "All" => Ok(Self::All),
            "standard" | "Standard" => Ok(Self::Standard),
            "none" | "None" => Ok(Self::Selection(Default::default())),
            _ => Self::try_from_selection(modules),
        }
    }
}

impl fmt::Display for RpcModuleSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut modules = self.iter_selection().map(|s| s.to_string()).collect::<Vec<_>>();
        modules.sort_unstable();
        write!(f, "[{}]", modules.join(", "))
    }
}

/// Represents RPC namespaces served by a pocc node
#[derive(
    Debug,
    Clone,
    Copy,
    Eq,
    PartialEq,
    Hash,
    AsRefStr,
    IntoStaticStr,
    VariantNames,
    VariantArray,
    EnumIter,
    Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "kebab-case")]
pub enum PoccRpcModule {
    /// `pocc_` module
    Pocc,
    /// `txpool_` module
    Txpool,
    /// `debug_` module
    Debug,
    /// `personal_` module
    Personal,
    /// `rpc_` module
    Rpc,
}

// === impl PoccRpcModule ===

impl PoccRpcModule {
    /// Returns the number of variants in the enum
    pub const fn variant_count() -> usize {
        <Self as VariantArray>::VARIANTS.len()
    }

    /// Returns all variant names of the enum
    pub const fn all_variant_names() -> &'static [&'static str] {
        <Self as VariantNames>::VARIANTS
    }

    /// Returns all variants of the enum
    pub fn modules() -> impl IntoIterator<Item = Self> {
        use strum::IntoEnumIterator;
        Self::iter()
    }

    /// Returns the string representation of the module.
    #[inline]
    pub fn as_str(&self) -> &'static str {
        self.into()
    }
}

impl FromStr for PoccRpcModule {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "pocc" => Self::Pocc,
            "txpool" => Self::Txpool,
            "debug" => Self::Debug,
            "personal" => Self::Personal,
            "rpc" => Self::Rpc,
            _ => return Err(ParseError::VariantNotFound),
        })
    }
}

impl TryFrom<&str> for PoccRpcModule {
    type Error = ParseError;
    fn try_from(s: &str) -> Result<Self, <Self as TryFrom<&str>>::Error> {
        FromStr::from_str(s)
    }
}

impl fmt::Display for PoccRpcModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_ref())
    }
}

impl Serialize for PoccRpcModule {
    fn serialize<S>(&self, s: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        s.serialize_str(self.as_ref())
    }
}
