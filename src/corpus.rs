//! Restartable lazy sequences of SMILES strings.

use std::borrow::Cow;
use std::marker::PhantomData;

/// A logical sequence of SMILES strings that can be iterated any number of times.
///
/// Each call to [`Corpus::documents`] starts a fresh pass over the same
/// sequence, so vocabulary selection and encoder training can each stream the
/// corpus without forcing it into memory.
pub trait Corpus: Sync {
    fn documents(&self) -> Box<dyn Iterator<Item = Cow<'_, str>> + '_>;

    /// Number of documents. The default walks one full pass.
    fn len(&self) -> usize {
        self.documents().count()
    }

    fn is_empty(&self) -> bool {
        self.documents().next().is_none()
    }
}

impl<S: AsRef<str> + Sync> Corpus for [S] {
    fn documents(&self) -> Box<dyn Iterator<Item = Cow<'_, str>> + '_> {
        Box::new(self.iter().map(|s| Cow::Borrowed(s.as_ref())))
    }

    fn len(&self) -> usize {
        <[S]>::len(self)
    }

    fn is_empty(&self) -> bool {
        <[S]>::is_empty(self)
    }
}

impl<S: AsRef<str> + Sync> Corpus for Vec<S> {
    fn documents(&self) -> Box<dyn Iterator<Item = Cow<'_, str>> + '_> {
        self.as_slice().documents()
    }

    fn len(&self) -> usize {
        Vec::len(self)
    }

    fn is_empty(&self) -> bool {
        Vec::is_empty(self)
    }
}

/// A corpus backed by a factory that produces a new iterator on every pass.
///
/// ```
/// use rustmolvec::{Corpus, ReplayableCorpus};
///
/// let corpus = ReplayableCorpus::new(|| ["CCO", "CCl"].into_iter().map(String::from));
/// assert_eq!(corpus.len(), 2);
/// assert_eq!(corpus.len(), 2);
/// ```
pub struct ReplayableCorpus<F, I> {
    factory: F,
    _iter: PhantomData<fn() -> I>,
}

impl<F, I> ReplayableCorpus<F, I>
where
    F: Fn() -> I + Sync,
    I: Iterator<Item = String>,
{
    pub fn new(factory: F) -> Self {
        Self {
            factory,
            _iter: PhantomData,
        }
    }
}

impl<F, I> Corpus for ReplayableCorpus<F, I>
where
    F: Fn() -> I + Sync,
    I: Iterator<Item = String>,
{
    fn documents(&self) -> Box<dyn Iterator<Item = Cow<'_, str>> + '_> {
        Box::new((self.factory)().map(Cow::Owned))
    }
}
