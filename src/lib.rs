#![warn(missing_docs)]
#![doc(test(no_crate_inject))]
#![doc(test(attr(deny(unused, future_incompatible))))]

//! This crate enumerates the Moore families and co-Moore families over a small finite ground set,
//! and counts the pairs of one Moore family and one co-Moore family whose closure and interior
//! operators are compatible.
//!
//! A Moore family over `X` contains `X` and is closed under intersection; every Moore family
//! induces a closure operator. A co-Moore family contains the empty set and is closed under
//! union; it induces an interior operator. Taking complements maps one kind onto the other.
//!
//! Both kinds are enumerated by a depth-first search that starts from the full powerset and
//! removes one member at a time. A removal is only allowed if the removed set becomes the least
//! (for co-Moore families, the greatest) set missing from the family, under a fixed linear
//! extension of inclusion, and if the removed set can't be recovered from the remaining members.
//! This is Higuchi's characterization of the covering relation in the lattice of Moore families,
//! and it guarantees that every family is reached exactly once.
//!
//! ```
//! use moore_families::{co_moore_families, count_compatible_pairs, moore_families, Subset};
//!
//! let ground = Subset::new(&[0u8, 1, 2]);
//! let moore: Vec<_> = moore_families(&ground).collect();
//! let co_moore: Vec<_> = co_moore_families(&ground).collect();
//!
//! assert_eq!(moore.len(), 61);
//! assert_eq!(co_moore.len(), 61);
//! assert_eq!(count_compatible_pairs(&moore, &co_moore, &ground), 377);
//! ```

pub use sorted_iter;

use lasso::Spur;
use log::{debug, trace};
use smallvec::SmallVec;
use sorted_iter::assume::AssumeSortedByItemExt;
use sorted_iter::sorted_iterator::SortedByItem;
use sorted_iter::SortedIterator;
use std::cmp::Ordering;
use std::iter;
use std::marker::PhantomData;

/// Types which can be used as elements of a [`Subset`].
pub trait ElementId: Sized + Copy + std::hash::Hash + Ord {
    /// SmallVec contains two `usize` fields which overlap with the inline vector, so subsets will
    /// have minimum size if this array occupies the same number of bytes.
    ///
    /// It can be declared like this for any implementation, or you can have the [`element_id!`]
    /// macro do it for you.
    ///
    /// ```ignore
    /// use std::mem::size_of;
    /// type SmallArray = [Self; 2 * size_of::<usize>() / size_of::<Self>()];
    /// ```
    type SmallArray: smallvec::Array<Item = Self> + Clone + std::fmt::Debug + std::hash::Hash + Ord;
}

/// Generates implementations of the [`ElementId`] trait which set the associated `SmallArray`
/// type to the biggest array that will fit within a [`SmallVec`][smallvec::SmallVec]'s minimum
/// size.
///
/// It also generates a test with the given `$testname` that checks that the generated definition
/// is as small as the smallest `SmallVec`.
///
/// For example, this library provides implementations for the basic unsigned integer types using
/// this declaration:
///
/// ```ignore
/// element_id![unsigned_id_size, u8, u16, u32, u64, usize];
/// ```
#[macro_export]
macro_rules! element_id {
    ($testname:ident, $($t:ty),*) => {
        $(
            impl $crate::ElementId for $t {
                type SmallArray = [
                    Self;
                    2 * ::std::mem::size_of::<usize>() / ::std::mem::size_of::<Self>()
                ];
            }
        )*

        #[cfg(test)]
        #[test]
        fn $testname() {
            use $crate::Subset;
            use smallvec::SmallVec;
            use std::mem::size_of;
            $(
                assert_eq!(
                    size_of::<Subset<$t>>(),
                    size_of::<SmallVec<[(); 0]>>()
                );
            )*
        }
    };
}

element_id![lasso_id_size, Spur];
element_id![unsigned_id_size, u8, u16, u32, u64, usize];
element_id![signed_id_size, i8, i16, i32, i64, isize];

/// A subset of the ground set.
///
/// The elements are kept sorted and deduplicated, so the derived equality and hashing treat
/// subsets as sets, and the derived ordering is lexicographic on the sorted elements. Subsets
/// smaller than the length of [`ElementId::SmallArray`] don't allocate.
#[derive(Clone, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Subset<E: ElementId>(SmallVec<E::SmallArray>);

impl<E: ElementId> Subset<E> {
    /// Creates a subset containing the specified elements.
    ///
    /// It's okay if the provided slice contains duplicates.
    pub fn new(ids: &[E]) -> Self {
        let mut v = SmallVec::from_slice(ids);
        v.sort_unstable();
        v.dedup();
        Subset(v)
    }

    /// The empty set.
    pub fn empty() -> Self {
        Subset(SmallVec::new())
    }

    /// The number of elements in the set.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the set has no elements.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns an iterator over the elements of this set, in ascending order.
    ///
    /// ```
    /// use moore_families::Subset;
    ///
    /// let abc = Subset::new(&[2, 3, 1]);
    /// let mut it = abc.iter();
    /// assert_eq!(it.next(), Some(1));
    /// assert_eq!(it.next(), Some(2));
    /// assert_eq!(it.next(), Some(3));
    /// assert_eq!(it.next(), None);
    /// ```
    pub fn iter(&self) -> impl Iterator<Item = E> + SortedByItem + Clone + '_ {
        self.0.iter().copied().assume_sorted_by_item()
    }

    /// Returns `true` if `id` is an element of this set.
    pub fn contains(&self, id: E) -> bool {
        self.0.binary_search(&id).is_ok()
    }

    /// Returns `true` if `other` contains every element that `self` does.
    ///
    /// ```
    /// use moore_families::Subset;
    /// let nil = Subset::new(&[]);
    /// let one = Subset::new(&[1]);
    ///
    /// assert!(nil.is_subset(&one));
    /// assert!(nil.is_subset(&nil));
    /// assert!(one.is_subset(&one));
    /// assert!(!one.is_subset(&nil));
    /// ```
    pub fn is_subset(&self, other: &Self) -> bool {
        self.len() <= other.len() && self.iter().intersection(other.iter()).eq(self.iter())
    }

    /// Returns `true` if `self` contains every element that `other` does.
    ///
    /// ```
    /// use moore_families::Subset;
    /// let nil = Subset::new(&[]);
    /// let one = Subset::new(&[1]);
    ///
    /// assert!(!nil.is_superset(&one));
    /// assert!(nil.is_superset(&nil));
    /// assert!(one.is_superset(&one));
    /// assert!(one.is_superset(&nil));
    /// ```
    pub fn is_superset(&self, other: &Self) -> bool {
        other.is_subset(self)
    }

    /// The elements common to both sets.
    ///
    /// ```
    /// use moore_families::Subset;
    ///
    /// let ab = Subset::new(&[1, 2]);
    /// let bc = Subset::new(&[2, 3]);
    /// assert_eq!(ab.intersection(&bc), Subset::new(&[2]));
    /// ```
    pub fn intersection(&self, other: &Self) -> Self {
        Subset(self.iter().intersection(other.iter()).collect())
    }

    /// The elements of either set.
    ///
    /// ```
    /// use moore_families::Subset;
    ///
    /// let ab = Subset::new(&[1, 2]);
    /// let bc = Subset::new(&[2, 3]);
    /// assert_eq!(ab.union(&bc), Subset::new(&[1, 2, 3]));
    /// ```
    pub fn union(&self, other: &Self) -> Self {
        self.iter().union(other.iter()).collect()
    }

    /// The elements of `ground` which are not in this set.
    pub fn complement_in(&self, ground: &Self) -> Self {
        ground.iter().filter(|&id| !self.contains(id)).collect()
    }

    /// Returns every subset of this set, ordered by [`linear_extension_cmp`].
    ///
    /// ```
    /// use moore_families::Subset;
    ///
    /// let ab = Subset::new(&[1, 2]);
    /// let mut it = ab.subsets();
    /// assert_eq!(it.next(), Some(Subset::new(&[])));
    /// assert_eq!(it.next(), Some(Subset::new(&[1])));
    /// assert_eq!(it.next(), Some(Subset::new(&[2])));
    /// assert_eq!(it.next(), Some(Subset::new(&[1, 2])));
    /// assert_eq!(it.next(), None);
    /// ```
    ///
    /// # Panics
    ///
    /// This method panics if the set has so many elements that its subsets can't be counted in a
    /// `usize`. Long before that, the powerset won't fit in memory.
    pub fn subsets(&self) -> impl DoubleEndedIterator<Item = Self> + ExactSizeIterator {
        assert!(
            self.len() < usize::BITS as usize,
            "{} elements have too many subsets to enumerate",
            self.len()
        );

        let subsets = (0..1usize << self.len()).map(|mask| {
            // Elements are picked in order, so each subset comes out sorted.
            Subset(
                self.0
                    .iter()
                    .enumerate()
                    .filter(|&(bit, _)| mask & (1 << bit) != 0)
                    .map(|(_, &id)| id)
                    .collect(),
            )
        });
        linear_extension_order(subsets, false).into_iter()
    }
}

impl<E: ElementId + std::fmt::Debug> std::fmt::Debug for Subset<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.0.iter()).finish()
    }
}

impl<E: ElementId> iter::FromIterator<E> for Subset<E> {
    /// Creates a subset containing the specified elements.
    ///
    /// It's okay if the provided iterator contains duplicates.
    fn from_iter<I: IntoIterator<Item = E>>(iter: I) -> Self {
        let mut v = SmallVec::from_iter(iter);
        v.sort_unstable();
        v.dedup();
        Subset(v)
    }
}

/// Compares subsets by size first, then lexicographically by their sorted elements.
///
/// This is a total order on subsets which extends inclusion: a proper subset always compares less
/// than its superset. Both enumerations remove members in this order.
///
/// ```
/// use moore_families::{linear_extension_cmp, Subset};
/// use std::cmp::Ordering;
///
/// let c = Subset::new(&[3]);
/// let ab = Subset::new(&[1, 2]);
/// assert_eq!(linear_extension_cmp(&c, &ab), Ordering::Less);
/// assert_eq!(c.cmp(&ab), Ordering::Greater);
/// ```
pub fn linear_extension_cmp<E: ElementId>(a: &Subset<E>, b: &Subset<E>) -> Ordering {
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

/// Sorts `subsets` by [`linear_extension_cmp`], or by its reverse if `reverse` is set.
pub fn linear_extension_order<E, I>(subsets: I, reverse: bool) -> Vec<Subset<E>>
where
    E: ElementId,
    I: IntoIterator<Item = Subset<E>>,
{
    let mut ordered: Vec<_> = subsets.into_iter().collect();
    if reverse {
        ordered.sort_unstable_by(|a, b| linear_extension_cmp(b, a));
    } else {
        ordered.sort_unstable_by(linear_extension_cmp);
    }
    ordered
}

/// The first of `subsets` under [`linear_extension_cmp`], or `None` if there are none.
///
/// ```
/// use moore_families::{minimal_element, Subset};
///
/// let subsets = [Subset::new(&[1, 2]), Subset::new(&[3]), Subset::new(&[2])];
/// assert_eq!(minimal_element(&subsets), Some(&Subset::new(&[2])));
/// assert_eq!(minimal_element(&[] as &[Subset<u8>]), None);
/// ```
pub fn minimal_element<'a, E, I>(subsets: I) -> Option<&'a Subset<E>>
where
    E: ElementId + 'a,
    I: IntoIterator<Item = &'a Subset<E>>,
{
    subsets.into_iter().min_by(|a, b| linear_extension_cmp(a, b))
}

/// The last of `subsets` under [`linear_extension_cmp`], or `None` if there are none.
pub fn maximal_element<'a, E, I>(subsets: I) -> Option<&'a Subset<E>>
where
    E: ElementId + 'a,
    I: IntoIterator<Item = &'a Subset<E>>,
{
    subsets.into_iter().max_by(|a, b| linear_extension_cmp(a, b))
}

/// A family of subsets of the ground set.
///
/// Members are kept sorted by [`linear_extension_cmp`], so there's a canonical order and derived
/// Eq/Ord/Hash just work.
#[derive(Clone, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Family<E: ElementId> {
    members: Vec<Subset<E>>,
}

impl<E: ElementId> Family<E> {
    /// Creates a new empty family.
    pub fn new() -> Self {
        Family {
            members: Vec::new(),
        }
    }

    /// The family of every subset of `ground`. It is both a Moore family and a co-Moore family.
    pub fn powerset(ground: &Subset<E>) -> Self {
        Family {
            members: ground.subsets().collect(),
        }
    }

    fn position(&self, subset: &Subset<E>) -> Result<usize, usize> {
        self.members
            .binary_search_by(|probe| linear_extension_cmp(probe, subset))
    }

    /// Adds a member to this family, if it isn't already present.
    pub fn insert(&mut self, subset: Subset<E>) -> &mut Self {
        if let Err(insert_at) = self.position(&subset) {
            self.members.insert(insert_at, subset);
        }
        self
    }

    /// Removes a member from this family. Returns `true` if it was present.
    pub fn remove(&mut self, subset: &Subset<E>) -> bool {
        match self.position(subset) {
            Ok(index) => {
                self.members.remove(index);
                true
            }
            Err(_) => false,
        }
    }

    /// A copy of this family without the given member.
    pub fn without(&self, subset: &Subset<E>) -> Self {
        let mut family = self.clone();
        family.remove(subset);
        family
    }

    /// Returns `true` if `subset` is a member of this family.
    pub fn contains(&self, subset: &Subset<E>) -> bool {
        self.position(subset).is_ok()
    }

    /// Returns an iterator over the members of this family, ordered by [`linear_extension_cmp`].
    ///
    /// ```
    /// use moore_families::{Family, Subset};
    ///
    /// let mut family = Family::new();
    /// family.insert(Subset::new(&[2, 1])).insert(Subset::new(&[3]));
    ///
    /// let mut it = family.iter();
    /// assert_eq!(it.next(), Some(&Subset::new(&[3])));
    /// assert_eq!(it.next(), Some(&Subset::new(&[1, 2])));
    /// assert_eq!(it.next(), None);
    /// ```
    pub fn iter(
        &self,
    ) -> impl DoubleEndedIterator<Item = &Subset<E>> + ExactSizeIterator + iter::FusedIterator + '_
    {
        self.members.iter()
    }

    /// The number of members.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Returns `true` if the family has no members.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// The intersection of every member which contains `subset`, or `None` if no member does.
    pub fn meet_above(&self, subset: &Subset<E>) -> Option<Subset<E>> {
        self.members
            .iter()
            .filter(|member| member.is_superset(subset))
            .cloned()
            .reduce(|meet, member| meet.intersection(&member))
    }

    /// The union of every member contained in `subset`, or `None` if no member is.
    pub fn join_below(&self, subset: &Subset<E>) -> Option<Subset<E>> {
        self.members
            .iter()
            .filter(|member| member.is_subset(subset))
            .cloned()
            .reduce(|join, member| join.union(&member))
    }

    /// The closure of `subset` under the operator this family induces: the smallest member
    /// containing it.
    ///
    /// If no member contains `subset`, the subset itself is returned. That can't happen for a
    /// Moore family, which always contains the whole ground set.
    ///
    /// ```
    /// use moore_families::{Family, Subset};
    ///
    /// let mut family = Family::new();
    /// family.insert(Subset::new(&[1, 2, 3])).insert(Subset::new(&[1, 2]));
    ///
    /// assert_eq!(family.closure(&Subset::new(&[1])), Subset::new(&[1, 2]));
    /// assert_eq!(family.closure(&Subset::new(&[3])), Subset::new(&[1, 2, 3]));
    /// assert_eq!(family.closure(&Subset::new(&[4])), Subset::new(&[4]));
    /// ```
    pub fn closure(&self, subset: &Subset<E>) -> Subset<E> {
        self.meet_above(subset).unwrap_or_else(|| subset.clone())
    }

    /// The interior of `subset` under the operator this family induces: the union of every
    /// member it contains, which is empty if there are none.
    ///
    /// ```
    /// use moore_families::{Family, Subset};
    ///
    /// let mut family = Family::new();
    /// family.insert(Subset::new(&[1])).insert(Subset::new(&[2]));
    ///
    /// assert_eq!(family.interior(&Subset::new(&[1, 2, 3])), Subset::new(&[1, 2]));
    /// assert_eq!(family.interior(&Subset::new(&[3])), Subset::new(&[]));
    /// ```
    pub fn interior(&self, subset: &Subset<E>) -> Subset<E> {
        self.join_below(subset).unwrap_or_else(Subset::empty)
    }

    /// Returns `true` if this family contains `ground` and is closed under intersection.
    pub fn is_moore(&self, ground: &Subset<E>) -> bool {
        self.contains(ground)
            && self.members.iter().all(|a| {
                self.members
                    .iter()
                    .all(|b| self.contains(&a.intersection(b)))
            })
    }

    /// Returns `true` if this family contains the empty set and is closed under union.
    pub fn is_co_moore(&self) -> bool {
        self.contains(&Subset::empty())
            && self
                .members
                .iter()
                .all(|a| self.members.iter().all(|b| self.contains(&a.union(b))))
    }

    /// The family of complements, relative to `ground`, of this family's members.
    ///
    /// Complementing a Moore family gives a co-Moore family and vice versa.
    pub fn complemented(&self, ground: &Subset<E>) -> Self {
        self.members
            .iter()
            .map(|member| member.complement_in(ground))
            .collect()
    }
}

impl<E: ElementId> Default for Family<E> {
    fn default() -> Self {
        Family::new()
    }
}

impl<E: ElementId + std::fmt::Debug> std::fmt::Debug for Family<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.members.iter()).finish()
    }
}

impl<E: ElementId> iter::FromIterator<Subset<E>> for Family<E> {
    /// Creates a family with the specified members.
    ///
    /// It's okay if the provided iterator contains duplicates.
    fn from_iter<I: IntoIterator<Item = Subset<E>>>(iter: I) -> Self {
        let mut members = linear_extension_order(iter, false);
        members.dedup();
        Family { members }
    }
}

/// The two dual kinds of families this crate enumerates.
///
/// Each kind decides which member is never removed, which way the search visits candidates, and
/// how a removed member could be recovered from the rest of the family.
pub trait FamilyKind {
    /// A short name used in log messages.
    const NAME: &'static str;

    /// Whether removal candidates are visited from the greatest down.
    const DESCENDING: bool;

    /// The member every family of this kind must contain.
    fn fixed_member<E: ElementId>(ground: &Subset<E>) -> Subset<E>;

    /// The first missing subset the search must have removed last: the minimal one for Moore
    /// families, the maximal one for co-Moore families.
    fn extremal<'a, E, I>(missing: I) -> Option<&'a Subset<E>>
    where
        E: ElementId + 'a,
        I: IntoIterator<Item = &'a Subset<E>>;

    /// What the remaining members of `family` generate around `subset`, if anything.
    fn hull<E: ElementId>(family: &Family<E>, subset: &Subset<E>) -> Option<Subset<E>>;

    /// Checks the defining property of this kind directly.
    fn is_closed<E: ElementId>(family: &Family<E>, ground: &Subset<E>) -> bool;
}

/// Families containing the ground set and closed under intersection.
#[derive(Clone, Copy, Debug)]
pub struct Moore;

impl FamilyKind for Moore {
    const NAME: &'static str = "Moore";
    const DESCENDING: bool = false;

    fn fixed_member<E: ElementId>(ground: &Subset<E>) -> Subset<E> {
        ground.clone()
    }

    fn extremal<'a, E, I>(missing: I) -> Option<&'a Subset<E>>
    where
        E: ElementId + 'a,
        I: IntoIterator<Item = &'a Subset<E>>,
    {
        minimal_element(missing)
    }

    fn hull<E: ElementId>(family: &Family<E>, subset: &Subset<E>) -> Option<Subset<E>> {
        family.meet_above(subset)
    }

    fn is_closed<E: ElementId>(family: &Family<E>, ground: &Subset<E>) -> bool {
        family.is_moore(ground)
    }
}

/// Families containing the empty set and closed under union.
#[derive(Clone, Copy, Debug)]
pub struct CoMoore;

impl FamilyKind for CoMoore {
    const NAME: &'static str = "co-Moore";
    const DESCENDING: bool = true;

    fn fixed_member<E: ElementId>(_ground: &Subset<E>) -> Subset<E> {
        Subset::empty()
    }

    fn extremal<'a, E, I>(missing: I) -> Option<&'a Subset<E>>
    where
        E: ElementId + 'a,
        I: IntoIterator<Item = &'a Subset<E>>,
    {
        maximal_element(missing)
    }

    fn hull<E: ElementId>(family: &Family<E>, subset: &Subset<E>) -> Option<Subset<E>> {
        family.join_below(subset)
    }

    fn is_closed<E: ElementId>(family: &Family<E>, _ground: &Subset<E>) -> bool {
        family.is_co_moore()
    }
}

/// Decides whether `family`, which is a family of kind `K` with `removed` taken out, is itself a
/// family of kind `K` reached by a legal step of the search.
///
/// Two conditions must hold. First, among the members of `powerset` missing from `family`,
/// `removed` must be the extremal one (see [`FamilyKind::extremal`]). Second, the remaining
/// members must not regenerate `removed`: for Moore families the members containing it must not
/// intersect to exactly `removed`, and dually for co-Moore families.
///
/// The search never offers [`FamilyKind::fixed_member`] for removal, and this check doesn't
/// reject it on its own.
pub fn is_legal_removal<E, K>(powerset: &Family<E>, family: &Family<E>, removed: &Subset<E>) -> bool
where
    E: ElementId,
    K: FamilyKind,
{
    let missing = powerset.iter().filter(|subset| !family.contains(subset));
    if K::extremal(missing) != Some(removed) {
        return false;
    }
    K::hull(family, removed).map_or(true, |hull| hull != *removed)
}

struct Frame<E: ElementId> {
    family: Family<E>,
    candidates: std::vec::IntoIter<Subset<E>>,
}

/// A depth-first search producing every family of kind `K` over a ground set, each exactly once.
///
/// The first family produced is always the full powerset. After producing a family, the search
/// tries removing each of its members in turn, in the order given by [`FamilyKind::DESCENDING`],
/// and descends into every removal that [`is_legal_removal`] accepts.
///
/// Debug builds also check every produced family against [`FamilyKind::is_closed`]; release
/// builds skip that check and rely on the removal conditions alone.
pub struct Families<E: ElementId, K: FamilyKind> {
    ground: Subset<E>,
    powerset: Family<E>,
    start: Option<Family<E>>,
    stack: Vec<Frame<E>>,
    produced: usize,
    kind: PhantomData<K>,
}

impl<E: ElementId, K: FamilyKind> Families<E, K> {
    /// Prepares a search over the subsets of `ground`.
    ///
    /// # Panics
    ///
    /// See [`Subset::subsets`].
    pub fn new(ground: &Subset<E>) -> Self {
        let powerset = Family::powerset(ground);
        Families {
            ground: ground.clone(),
            start: Some(powerset.clone()),
            powerset,
            stack: Vec::new(),
            produced: 0,
            kind: PhantomData,
        }
    }

    /// The full powerset of the ground set.
    pub fn powerset(&self) -> &Family<E> {
        &self.powerset
    }

    fn enter(&mut self, family: Family<E>) -> Family<E> {
        debug_assert!(K::is_closed(&family, &self.ground));

        let fixed = K::fixed_member(&self.ground);
        let candidates = linear_extension_order(
            family.iter().filter(|member| **member != fixed).cloned(),
            K::DESCENDING,
        );

        self.stack.push(Frame {
            family: family.clone(),
            candidates: candidates.into_iter(),
        });
        self.produced += 1;
        family
    }
}

impl<E: ElementId, K: FamilyKind> Iterator for Families<E, K> {
    type Item = Family<E>;

    fn next(&mut self) -> Option<Family<E>> {
        if let Some(family) = self.start.take() {
            return Some(self.enter(family));
        }

        while let Some(frame) = self.stack.last_mut() {
            let removed = match frame.candidates.next() {
                Some(removed) => removed,
                None => {
                    self.stack.pop();
                    if self.stack.is_empty() {
                        debug!("found {} {} families", self.produced, K::NAME);
                    }
                    continue;
                }
            };

            let family = frame.family.without(&removed);
            if is_legal_removal::<E, K>(&self.powerset, &family, &removed) {
                trace!(
                    "{} search descends to depth {} by removing a {}-element set",
                    K::NAME,
                    self.stack.len(),
                    removed.len()
                );
                return Some(self.enter(family));
            }
            trace!(
                "{} search rejects removing a {}-element set at depth {}",
                K::NAME,
                removed.len(),
                self.stack.len()
            );
        }
        None
    }
}

impl<E: ElementId, K: FamilyKind> iter::FusedIterator for Families<E, K> {}

/// Every Moore family over `ground`.
///
/// ```
/// use moore_families::{moore_families, Family, Subset};
///
/// let ground = Subset::new(&[0u8]);
/// let mut it = moore_families(&ground);
/// assert_eq!(it.next(), Some(Family::powerset(&ground)));
/// assert_eq!(it.next(), Some([ground.clone()].iter().cloned().collect()));
/// assert_eq!(it.next(), None);
/// ```
pub fn moore_families<E: ElementId>(ground: &Subset<E>) -> Families<E, Moore> {
    Families::new(ground)
}

/// Every co-Moore family over `ground`.
pub fn co_moore_families<E: ElementId>(ground: &Subset<E>) -> Families<E, CoMoore> {
    Families::new(ground)
}

/// The first of the three compatibility conditions to fail, with the subsets witnessing it.
///
/// Here `cl` is the closure operator of the Moore family and `int` the interior operator of the
/// co-Moore family.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Violation<E: ElementId> {
    /// `cl(int(a))` differs from `int(cl(a))`.
    NotCommuting {
        /// The subset whose operators don't commute.
        a: Subset<E>,
    },

    /// `a ⊆ int(b)` and `cl(a) ⊆ b`, yet `cl(a) ⊄ int(b)`.
    NotImplied {
        /// The subset whose closure escapes the interior.
        a: Subset<E>,
        /// The bound it was compared against.
        b: Subset<E>,
    },

    /// `a` and `b` differ but have the same closure and the same interior.
    NotSeparated {
        /// The earlier of the two subsets.
        a: Subset<E>,
        /// The later one.
        b: Subset<E>,
    },
}

impl<E: ElementId> Violation<E> {
    /// A short label for the failed condition.
    ///
    /// ```
    /// use moore_families::{Subset, Violation};
    ///
    /// let violation = Violation::NotCommuting { a: Subset::<u8>::empty() };
    /// assert_eq!(violation.condition(), "commutativity");
    /// ```
    pub fn condition(&self) -> &'static str {
        match self {
            Violation::NotCommuting { .. } => "commutativity",
            Violation::NotImplied { .. } => "implication",
            Violation::NotSeparated { .. } => "separation",
        }
    }
}

struct Operators<E: ElementId> {
    set: Subset<E>,
    closure: Subset<E>,
    interior: Subset<E>,
}

/// Tests every pair of subsets of `ground` against the compatibility conditions for the closure
/// operator of `cl_family` and the interior operator of `int_family`, stopping at the first
/// failure.
///
/// Pairs are visited with the first subset in the outer loop, both in [`linear_extension_cmp`]
/// order. When one pair fails several conditions, the earliest listed in [`Violation`] wins.
///
/// ```
/// use moore_families::{compatibility_violation, Family, Subset, Violation};
///
/// let ground = Subset::new(&[0u8]);
/// let top: Family<u8> = [ground.clone()].iter().cloned().collect();
/// let bottom: Family<u8> = [Subset::empty()].iter().cloned().collect();
///
/// // cl(int(∅)) = cl(∅) = {0}, but int(cl(∅)) = int({0}) = ∅.
/// assert_eq!(
///     compatibility_violation(&top, &bottom, &ground),
///     Some(Violation::NotCommuting { a: Subset::empty() })
/// );
/// ```
pub fn compatibility_violation<E: ElementId>(
    cl_family: &Family<E>,
    int_family: &Family<E>,
    ground: &Subset<E>,
) -> Option<Violation<E>> {
    let operators: Vec<_> = ground
        .subsets()
        .map(|set| Operators {
            closure: cl_family.closure(&set),
            interior: int_family.interior(&set),
            set,
        })
        .collect();

    for a in &operators {
        if cl_family.closure(&a.interior) != int_family.interior(&a.closure) {
            return Some(Violation::NotCommuting { a: a.set.clone() });
        }

        for b in &operators {
            if a.set.is_subset(&b.interior)
                && a.closure.is_subset(&b.set)
                && !a.closure.is_subset(&b.interior)
            {
                return Some(Violation::NotImplied {
                    a: a.set.clone(),
                    b: b.set.clone(),
                });
            }

            if a.closure == b.closure && a.interior == b.interior && a.set != b.set {
                return Some(Violation::NotSeparated {
                    a: a.set.clone(),
                    b: b.set.clone(),
                });
            }
        }
    }
    None
}

/// Returns `true` if the closure operator of `cl_family` and the interior operator of
/// `int_family` satisfy all three compatibility conditions on every pair of subsets of `ground`.
pub fn is_compatible_pair<E: ElementId>(
    cl_family: &Family<E>,
    int_family: &Family<E>,
    ground: &Subset<E>,
) -> bool {
    match compatibility_violation(cl_family, int_family, ground) {
        Some(violation) => {
            debug!(
                "pair of {} and {} members fails {}",
                cl_family.len(),
                int_family.len(),
                violation.condition()
            );
            false
        }
        None => {
            debug!(
                "pair of {} and {} members is compatible",
                cl_family.len(),
                int_family.len()
            );
            true
        }
    }
}

/// Every compatible pair from the cross product of `moore` and `co_moore`, with the Moore family
/// varying slowest.
pub fn compatible_pairs<'a, E: ElementId>(
    moore: &'a [Family<E>],
    co_moore: &'a [Family<E>],
    ground: &'a Subset<E>,
) -> impl Iterator<Item = (&'a Family<E>, &'a Family<E>)> + 'a {
    moore
        .iter()
        .flat_map(move |cl| co_moore.iter().map(move |int| (cl, int)))
        .filter(move |&(cl, int)| is_compatible_pair(cl, int, ground))
}

/// The number of compatible pairs from the cross product of `moore` and `co_moore`.
pub fn count_compatible_pairs<E: ElementId>(
    moore: &[Family<E>],
    co_moore: &[Family<E>],
    ground: &Subset<E>,
) -> usize {
    let count = compatible_pairs(moore, co_moore, ground).count();
    debug!(
        "{} of {} pairs are compatible",
        count,
        moore.len() * co_moore.len()
    );
    count
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    fn family(members: &[&[u8]]) -> Family<u8> {
        members.iter().map(|&m| Subset::new(m)).collect()
    }

    #[test]
    fn order_extends_inclusion() {
        let ground = Subset::new(&[0u8, 1, 2, 3]);
        let ordered: Vec<_> = ground.subsets().collect();
        for (i, a) in ordered.iter().enumerate() {
            for b in &ordered[..i] {
                assert!(!a.is_subset(b), "{:?} sorts after its superset {:?}", a, b);
            }
        }
    }

    #[test]
    fn reverse_order() {
        let subsets = vec![Subset::new(&[2u8]), Subset::new(&[0, 1]), Subset::new(&[1])];
        assert_eq!(
            linear_extension_order(subsets.clone(), true),
            vec![Subset::new(&[0, 1]), Subset::new(&[2]), Subset::new(&[1])]
        );
        assert_eq!(maximal_element(&subsets), Some(&Subset::new(&[0, 1])));
        assert_eq!(maximal_element(&[] as &[Subset<u8>]), None);
    }

    #[test]
    fn complement() {
        let ground = Subset::new(&[0u8, 1, 2]);
        assert_eq!(Subset::new(&[1]).complement_in(&ground), Subset::new(&[0, 2]));
        assert_eq!(Subset::empty().complement_in(&ground), ground);
    }

    #[test]
    fn family_membership() {
        let mut f = family(&[&[0, 1], &[]]);
        assert!(f.contains(&Subset::empty()));
        assert!(!f.contains(&Subset::new(&[0])));
        f.insert(Subset::new(&[0])).insert(Subset::new(&[0]));
        assert_eq!(f.len(), 3);
        assert!(f.remove(&Subset::new(&[0, 1])));
        assert!(!f.remove(&Subset::new(&[0, 1])));
        assert_eq!(f, family(&[&[], &[0]]));
    }

    #[test]
    fn hulls_of_nothing() {
        let f = family(&[&[1]]);
        assert_eq!(f.meet_above(&Subset::new(&[0])), None);
        assert_eq!(f.join_below(&Subset::new(&[0])), None);
        assert_eq!(f.closure(&Subset::new(&[0])), Subset::new(&[0]));
        assert_eq!(f.interior(&Subset::new(&[0])), Subset::empty());
    }

    #[test]
    fn defining_properties() {
        let ground = Subset::new(&[0u8, 1]);
        assert!(!family(&[&[0], &[1], &[0, 1]]).is_co_moore());
        assert!(!family(&[&[0], &[1], &[0, 1]]).is_moore(&ground));
        assert!(family(&[&[], &[0], &[1], &[0, 1]]).is_moore(&ground));
        assert!(family(&[&[0], &[0, 1]]).is_moore(&ground));
        assert!(family(&[&[], &[1]]).is_co_moore());
        assert!(!family(&[&[0], &[1]]).is_co_moore());
    }

    #[test]
    fn legal_removals() {
        let ground = Subset::new(&[0u8, 1]);
        let powerset = Family::powerset(&ground);

        // ∅ = {0} ∩ {1}, so it can't be removed while both remain.
        let without_nil = family(&[&[0], &[1], &[0, 1]]);
        assert!(!is_legal_removal::<u8, Moore>(&powerset, &without_nil, &Subset::empty()));

        // {0} ∩ {1} = ∅, so removing ∅ from the powerset leaves it recoverable.
        let without_0 = family(&[&[], &[1], &[0, 1]]);
        assert!(is_legal_removal::<u8, Moore>(&powerset, &without_0, &Subset::new(&[0])));

        // {0} isn't the least missing set once ∅ is gone too.
        let f = family(&[&[0], &[1], &[0, 1]]);
        let g = f.without(&Subset::new(&[1]));
        assert!(!is_legal_removal::<u8, Moore>(&powerset, &g, &Subset::new(&[1])));

        // Dually, {0, 1} = {0} ∪ {1} can't be removed from the powerset.
        let without_top = family(&[&[], &[0], &[1]]);
        assert!(!is_legal_removal::<u8, CoMoore>(
            &powerset,
            &without_top,
            &Subset::new(&[0, 1])
        ));
        let without_1 = family(&[&[], &[0], &[0, 1]]);
        assert!(is_legal_removal::<u8, CoMoore>(&powerset, &without_1, &Subset::new(&[1])));
    }

    #[test]
    fn search_order_over_two() {
        let ground = Subset::new(&[0u8, 1]);
        let moore: Vec<_> = moore_families(&ground).collect();
        assert_eq!(
            moore,
            vec![
                family(&[&[], &[0], &[1], &[0, 1]]),
                family(&[&[], &[1], &[0, 1]]),
                family(&[&[1], &[0, 1]]),
                family(&[&[], &[0], &[0, 1]]),
                family(&[&[0], &[0, 1]]),
                family(&[&[], &[0, 1]]),
                family(&[&[0, 1]]),
            ]
        );

        let co_moore: Vec<_> = co_moore_families(&ground).collect();
        assert_eq!(
            co_moore,
            vec![
                family(&[&[], &[0], &[1], &[0, 1]]),
                family(&[&[], &[0], &[0, 1]]),
                family(&[&[], &[0]]),
                family(&[&[], &[1], &[0, 1]]),
                family(&[&[], &[1]]),
                family(&[&[], &[0, 1]]),
                family(&[&[]]),
            ]
        );
    }

    #[test]
    fn exhausted_search_stays_exhausted() {
        let ground = Subset::new(&[0u8]);
        let mut families = co_moore_families(&ground);
        assert_eq!(families.by_ref().count(), 2);
        assert_eq!(families.next(), None);
        assert_eq!(families.next(), None);
    }

    #[test]
    fn powerset_is_compatible_with_itself() {
        let ground = Subset::new(&[0u8, 1, 2]);
        let powerset = Family::powerset(&ground);
        assert!(is_compatible_pair(&powerset, &powerset, &ground));
    }

    #[test]
    fn constant_closure() {
        let ground = Subset::new(&[0u8, 1]);
        let top = family(&[&[0, 1]]);
        let powerset = Family::powerset(&ground);
        // cl is constant and int is the identity, so every condition holds.
        assert!(is_compatible_pair(&top, &powerset, &ground));

        let mut int = family(&[&[], &[0, 1]]);
        assert_eq!(
            compatibility_violation(&top, &int, &ground),
            Some(Violation::NotSeparated {
                a: Subset::empty(),
                b: Subset::new(&[0]),
            })
        );

        int.insert(Subset::new(&[1]));
        assert_eq!(
            compatibility_violation(&top, &int, &ground),
            Some(Violation::NotSeparated {
                a: Subset::empty(),
                b: Subset::new(&[0]),
            })
        );
    }

    #[test]
    fn not_separated() {
        let ground = Subset::new(&[0u8, 1]);
        let cl = family(&[&[], &[0, 1]]);
        let int = family(&[&[]]);
        assert_eq!(
            compatibility_violation(&cl, &int, &ground),
            Some(Violation::NotSeparated {
                a: Subset::new(&[0]),
                b: Subset::new(&[1]),
            })
        );
    }

    #[test]
    fn violation_labels() {
        let ground = Subset::new(&[0u8, 1]);
        let cl = family(&[&[], &[0, 1]]);
        let int = family(&[&[]]);
        let violation = compatibility_violation(&cl, &int, &ground);
        assert_eq!(violation.as_ref().map(Violation::condition), Some("separation"));
        assert!(!is_compatible_pair(&cl, &int, &ground));

        let implied = Violation::NotImplied {
            a: Subset::<u8>::empty(),
            b: Subset::empty(),
        };
        assert_eq!(implied.condition(), "implication");
    }

    #[test]
    fn superset_hull() {
        let f = family(&[&[0, 1], &[0, 2], &[1]]);
        assert_eq!(f.meet_above(&Subset::new(&[0])), Some(Subset::new(&[0])));
        assert_eq!(f.meet_above(&Subset::new(&[1])), Some(Subset::new(&[1])));
        assert_eq!(f.meet_above(&Subset::new(&[2])), Some(Subset::new(&[0, 2])));
        assert!(Subset::new(&[0u8, 1]).is_superset(&Subset::new(&[1])));
    }

    #[test]
    fn release_search_matches_closed_families() {
        // Holds whether or not the search's own debug assertion is compiled in.
        let ground = Subset::new(&[0u8, 1, 2]);
        assert!(moore_families(&ground).all(|f| Moore::is_closed(&f, &ground)));
        assert!(co_moore_families(&ground).all(|f| CoMoore::is_closed(&f, &ground)));
    }

    #[test]
    fn non_commuting_operators() {
        let ground = Subset::new(&[0u8, 1]);
        let cl = family(&[&[0], &[0, 1]]);
        let int = family(&[&[], &[1], &[0, 1]]);
        // cl(int(∅)) = cl(∅) = {0}, int(cl(∅)) = int({0}) = ∅.
        assert_eq!(
            compatibility_violation(&cl, &int, &ground),
            Some(Violation::NotCommuting { a: Subset::empty() })
        );
    }
}
