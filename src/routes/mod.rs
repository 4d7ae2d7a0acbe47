/// Router Module Index
///
/// Every route this service owns is public: the entry route decides for itself
/// what a signed-in visitor sees.
pub mod public;
