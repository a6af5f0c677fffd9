//! Subnet membership filter.

use ipnet::IpNet;
use std::fmt;
use std::net::{AddrParseError, IpAddr, Ipv6Addr};
use std::sync::Arc;

use crate::error::{InvalidSubnetError, SubnetErrorKind};
use crate::row::{ColumnContext, Row};
use crate::trace::{NoopTracer, Tracer};

/// How subnet literals with host bits beyond the prefix are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ParseMode {
    /// Accept `192.168.1.5/24` and store it as `192.168.1.0/24`
    #[default]
    Loose,
    /// Reject subnets whose address is not the network boundary
    Strict,
}

impl ParseMode {
    /// Pick `Strict` when `strict` is true, `Loose` otherwise.
    pub fn from_strict(strict: bool) -> Self {
        if strict {
            ParseMode::Strict
        } else {
            ParseMode::Loose
        }
    }

    /// Parse one `address/prefix` literal under this mode.
    pub fn parse_subnet(self, subnet: &str) -> Result<IpNet, SubnetErrorKind> {
        let net: IpNet = subnet.parse().map_err(|_| SubnetErrorKind::Malformed)?;
        if self == ParseMode::Strict && net.addr() != net.network() {
            return Err(SubnetErrorKind::HostBitsSet);
        }
        Ok(net.trunc())
    }
}

/// Parse candidate text as an IPv4 or IPv6 address.
///
/// An IPv6 address may carry a zone suffix (`fe80::1%eth0`); the zone is
/// ignored for matching. Otherwise the text is used as-is, so surrounding
/// whitespace makes it invalid.
pub fn parse_address(text: &str) -> Result<IpAddr, AddrParseError> {
    match text.split_once('%') {
        Some((addr, zone)) if !zone.is_empty() && !zone.contains('%') => {
            addr.parse::<Ipv6Addr>().map(IpAddr::V6)
        }
        _ => text.parse(),
    }
}

/// Builder for [`SubnetFilter`].
///
/// # Examples
/// ```
/// use ipfilter::{FilterBuilder, LogTracer, ParseMode};
///
/// let filter = FilterBuilder::new()
///     .mode(ParseMode::Strict)
///     .tracer(LogTracer)
///     .build(["10.0.0.0/8", "fc00::/7"])
///     .unwrap();
/// assert_eq!(filter.len(), 2);
/// ```
#[derive(Clone)]
pub struct FilterBuilder {
    mode: ParseMode,
    tracer: Arc<dyn Tracer>,
}

impl FilterBuilder {
    /// Create a builder with loose parsing and no tracing.
    pub fn new() -> Self {
        Self {
            mode: ParseMode::Loose,
            tracer: Arc::new(NoopTracer),
        }
    }

    /// Set the subnet parse mode.
    pub fn mode(mut self, mode: ParseMode) -> Self {
        self.mode = mode;
        self
    }

    /// Shorthand for `mode(ParseMode::from_strict(strict))`.
    pub fn strict(self, strict: bool) -> Self {
        self.mode(ParseMode::from_strict(strict))
    }

    /// Set the tracer receiving diagnostic messages.
    pub fn tracer(self, tracer: impl Tracer + 'static) -> Self {
        self.shared_tracer(Arc::new(tracer))
    }

    /// Set a tracer that is shared with other components.
    pub fn shared_tracer(mut self, tracer: Arc<dyn Tracer>) -> Self {
        self.tracer = tracer;
        self
    }

    /// Parse every subnet and build the filter.
    ///
    /// Fails on the first subnet that does not parse; nothing is kept in
    /// that case.
    pub fn build<I, S>(self, subnets: I) -> Result<SubnetFilter, InvalidSubnetError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let subnets: Vec<S> = subnets.into_iter().collect();
        let mut networks = Vec::with_capacity(subnets.len());

        for (position, subnet) in subnets.iter().enumerate() {
            match self.mode.parse_subnet(subnet.as_ref()) {
                Ok(net) => networks.push(net),
                Err(reason) => {
                    return Err(InvalidSubnetError {
                        subnet: subnet.as_ref().to_string(),
                        position,
                        subnets: subnets.iter().map(|s| s.as_ref().to_string()).collect(),
                        reason,
                    });
                }
            }
        }

        let filter = SubnetFilter {
            networks,
            tracer: self.tracer,
        };
        filter.tracer.trace(format_args!(
            "parsed networks for filter: {}",
            NetworkList(&filter.networks)
        ));
        Ok(filter)
    }
}

impl Default for FilterBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for FilterBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterBuilder")
            .field("mode", &self.mode)
            .finish_non_exhaustive()
    }
}

/// SubnetFilter tests whether an IP address lies in any of a fixed set of
/// networks.
///
/// The network set is parsed once and never changes, so a filter can be
/// shared between threads and evaluated concurrently.
///
/// # Examples
/// ```
/// use ipfilter::SubnetFilter;
/// use std::collections::HashMap;
///
/// let filter = SubnetFilter::build(["192.168.1.0/24", "10.0.0.0/8"]).unwrap();
///
/// let mut row = HashMap::new();
/// row.insert("ip".to_string(), "192.168.1.55".to_string());
/// assert!(filter.test(&row, "ip"));
///
/// row.insert("ip".to_string(), "not-an-ip".to_string());
/// assert!(!filter.test(&row, "ip"));
/// ```
#[derive(Clone)]
pub struct SubnetFilter {
    /// Networks in the order they were supplied
    networks: Vec<IpNet>,
    tracer: Arc<dyn Tracer>,
}

impl SubnetFilter {
    /// Build a filter with loose parsing and no tracing.
    pub fn build<I, S>(subnets: I) -> Result<Self, InvalidSubnetError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        FilterBuilder::new().build(subnets)
    }

    /// Start configuring a filter.
    pub fn builder() -> FilterBuilder {
        FilterBuilder::new()
    }

    /// Get the parsed networks.
    pub fn networks(&self) -> &[IpNet] {
        &self.networks
    }

    /// Get the number of networks.
    pub fn len(&self) -> usize {
        self.networks.len()
    }

    /// Check if the filter has no networks (and so never matches).
    pub fn is_empty(&self) -> bool {
        self.networks.is_empty()
    }

    /// Check if an address is contained in any network.
    ///
    /// An IPv4 address never matches an IPv6 network and vice versa.
    pub fn contains(&self, ip: IpAddr) -> bool {
        self.networks.iter().any(|net| net.contains(&ip))
    }

    /// Check if text parses as an address contained in any network.
    pub fn matches(&self, text: &str) -> bool {
        match parse_address(text) {
            Ok(ip) => self.contains(ip),
            Err(e) => {
                self.tracer
                    .trace(format_args!("cannot parse {:?} as IP address: {}", text, e));
                false
            }
        }
    }

    /// Test one row, reading the field named by the active column.
    ///
    /// Never fails: a missing column, a missing or non-text field, and an
    /// unparseable address all yield `false`.
    pub fn test<R, C>(&self, row: &R, column: &C) -> bool
    where
        R: Row + ?Sized,
        C: ColumnContext + ?Sized,
    {
        let Some(name) = column.active_column() else {
            self.tracer.trace(format_args!("no active column, row not selected"));
            return false;
        };

        match row.field(name) {
            Some(text) => self.matches(text),
            None => {
                self.tracer
                    .trace(format_args!("field {:?} missing or not text", name));
                false
            }
        }
    }

    /// Turn the filter into a plain `(row, column) -> bool` closure for
    /// hosts that register predicates as functions.
    pub fn into_predicate<R, C>(self) -> impl Fn(&R, &C) -> bool + Send + Sync
    where
        R: Row + ?Sized,
        C: ColumnContext + ?Sized,
    {
        move |row: &R, column: &C| self.test(row, column)
    }
}

impl fmt::Debug for SubnetFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubnetFilter")
            .field("networks", &self.networks)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for SubnetFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        NetworkList(&self.networks).fmt(f)
    }
}

/// Formats networks as `[a/n, b/m]`.
struct NetworkList<'a>(&'a [IpNet]);

impl fmt::Display for NetworkList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, net) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", net)?;
        }
        write!(f, "]")
    }
}
