//! Convenience macros.

/// Declares an access key for [`Restricted`](crate::restricted::Restricted).
///
/// The generated type has a private field and a private `new`, so only the
/// module that invokes the macro can mint a key.
///
/// # Example
/// ```rust
/// mod registry_owner {
///     twostage::access_key!(
///         /// Proves the caller is the registry owner.
///         pub struct OwnerKey;
///     );
///
///     pub fn mint() -> OwnerKey {
///         OwnerKey::new()
///     }
/// }
///
/// let _key = registry_owner::mint();
/// ```
///
/// Code outside the declaring module cannot mint one:
///
/// ```compile_fail
/// mod registry_owner {
///     twostage::access_key!(pub struct OwnerKey;);
/// }
///
/// let _key = registry_owner::OwnerKey::new();
/// ```
#[macro_export]
macro_rules! access_key {
    ($(#[$meta:meta])* $vis:vis struct $name:ident;) => {
        $(#[$meta])*
        #[derive(Debug)]
        $vis struct $name(());

        impl $name {
            /// Mints a key. Private to the declaring module.
            #[allow(dead_code)]
            fn new() -> Self {
                Self(())
            }
        }
    };
}
