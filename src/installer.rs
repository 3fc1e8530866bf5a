//! Installers group related bindings into reusable units.

use crate::container::Container;
use crate::error::DiResult;

/// A unit of bindings installed into a container.
///
/// Closures taking `&Container` are installers too.
///
/// # Examples
///
/// ```rust
/// use ferrous_hive::{Container, DiResult, Installer, Resolver};
///
/// struct Greeting(&'static str);
///
/// struct GreetingInstaller;
///
/// impl Installer for GreetingInstaller {
///     fn install_bindings(&self, container: &Container) -> DiResult<()> {
///         container.bind::<Greeting>().from_instance(Greeting("hi"));
///         Ok(())
///     }
/// }
///
/// # fn main() -> DiResult<()> {
/// let container = Container::new();
/// container.install(&GreetingInstaller)?;
/// container.install(&|c: &Container| -> DiResult<()> {
///     c.bind::<u8>().from_instance(3);
///     Ok(())
/// })?;
/// assert_eq!(container.resolve::<Greeting>()?.0, "hi");
/// # Ok(())
/// # }
/// ```
pub trait Installer {
    fn install_bindings(&self, container: &Container) -> DiResult<()>;
}

impl<F> Installer for F
where
    F: Fn(&Container) -> DiResult<()>,
{
    fn install_bindings(&self, container: &Container) -> DiResult<()> {
        self(container)
    }
}
