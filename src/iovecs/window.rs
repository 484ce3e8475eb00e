use std::io::IoSlice;

/// Wrapper over a slice of [`IoSlice`]s that tracks the not yet
/// transferred window of one scatter/gather request.
///
/// The window only ever shrinks: [`TransferWindow::advance`] consumes
/// entries from the front as the kernel reports transferred byte
/// counts. The sum of the remaining entry lengths always equals the
/// bytes still to transfer.
#[derive(Debug)]
pub struct TransferWindow<'a> {
    /// The remaining, not yet transferred entries.
    bufs: &'a mut [IoSlice<'a>],
}

impl<'a> TransferWindow<'a> {
    pub fn new(bufs: &'a mut [IoSlice<'a>]) -> Self {
        Self { bufs }
    }

    /// The remaining entries.
    #[inline]
    pub fn as_slice(&self) -> &[IoSlice<'a>] {
        self.bufs
    }

    /// The first at most `max` entries, what a single transfer call may
    /// carry.
    #[inline]
    pub fn chunk(&self, max: usize) -> &[IoSlice<'a>] {
        &self.bufs[..self.bufs.len().min(max)]
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.bufs.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bufs.is_empty()
    }

    /// Sum of the remaining entry lengths.
    pub fn remaining(&self) -> usize {
        self.bufs.iter().map(|buf| buf.len()).sum()
    }

    /// Advances the window by `n` transferred bytes.
    ///
    /// Fully-consumed leading entries are dropped from the window. If
    /// `n` ends within an entry, that entry is resliced past the
    /// consumed prefix and becomes the new front. Zero-length leading
    /// entries are always dropped.
    ///
    /// # Panics
    ///
    /// Panics if `n` is larger than the remaining byte count.
    pub fn advance(&mut self, n: usize) {
        // number of buffers to remove.
        let mut bufs_to_remove_count = 0;
        // total length of all the to be removed buffers.
        let mut total_removed_len = 0;

        for buf in self.bufs.iter() {
            let buf_len = buf.len();
            // if the last byte to be removed is in this buffer, don't
            // remove the buffer, we just need to adjust its offset
            if total_removed_len + buf_len > n {
                break;
            } else {
                total_removed_len += buf_len;
                bufs_to_remove_count += 1;
            }
        }

        let bufs = std::mem::take(&mut self.bufs);
        self.bufs = &mut bufs[bufs_to_remove_count..];

        if self.bufs.is_empty() {
            if n > total_removed_len {
                panic!("cannot advance the window by more than its remaining length");
            }
            return;
        }

        // if not all buffers were removed, trim the consumed prefix off
        // the new front entry.
        let offset = n - total_removed_len;
        if offset > 0 {
            let slice = &*self.bufs[0];
            debug_assert!(offset < slice.len());
            // An `IoSlice` hands out its bytes only for the duration of
            // a borrow of itself, while the window must keep the `'a`
            // lifetime of the underlying mapping. This is safe:
            // 1. The pointer stays within the same mapped region, which
            //    outlives the window by construction.
            // 2. The raw parts are not leaked for other code to
            //    reconstruct; the slice is reassembled right here and
            //    stored back into the window.
            let ptr = slice.as_ptr();
            let slice = unsafe { std::slice::from_raw_parts(ptr.add(offset), slice.len() - offset) };
            self.bufs[0] = IoSlice::new(slice);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flatten(bufs: &[IoSlice<'_>]) -> Vec<u8> {
        bufs.iter().flat_map(|b| b.to_vec()).collect()
    }

    #[test]
    fn should_advance_into_first_buffer() {
        let bufs = [vec![0, 1, 2], vec![3, 4, 5]];
        let mut iovecs: Vec<_> = bufs.iter().map(|b| IoSlice::new(b)).collect();
        let mut window = TransferWindow::new(&mut iovecs);

        // should trim some from the first buffer
        let n = 2;
        window.advance(n);

        let expected: Vec<u8> = bufs.iter().flatten().skip(n).copied().collect();
        assert_eq!(flatten(window.as_slice()), expected);
        assert_eq!(window.remaining(), 4);
    }

    #[test]
    fn should_trim_whole_first_buffer() {
        let bufs = [vec![0, 1, 2], vec![3, 4, 5], vec![6, 7, 8]];
        let mut iovecs: Vec<_> = bufs.iter().map(|b| IoSlice::new(b)).collect();
        let mut window = TransferWindow::new(&mut iovecs);

        // should trim entire first buffer
        let n = 3;
        window.advance(n);

        let expected: Vec<u8> = bufs.iter().flatten().skip(n).copied().collect();
        assert_eq!(flatten(window.as_slice()), expected);
        assert_eq!(window.len(), 2);
    }

    #[test]
    fn should_advance_into_second_buffer() {
        let bufs = [vec![0, 1, 2], vec![3, 4, 5], vec![6, 7, 8]];
        let mut iovecs: Vec<_> = bufs.iter().map(|b| IoSlice::new(b)).collect();
        let mut window = TransferWindow::new(&mut iovecs);

        // should trim entire first buffer and some from the second
        let n = 5;
        window.advance(n);

        let expected: Vec<u8> = bufs.iter().flatten().skip(n).copied().collect();
        assert_eq!(flatten(window.as_slice()), expected);
    }

    #[test]
    fn should_trim_all_buffers() {
        let bufs = [vec![0, 1, 2], vec![3, 4, 5], vec![6, 7, 8]];
        let mut iovecs: Vec<_> = bufs.iter().map(|b| IoSlice::new(b)).collect();
        let mut window = TransferWindow::new(&mut iovecs);

        // should trim everything
        window.advance(9);

        assert!(window.is_empty());
        assert_eq!(window.remaining(), 0);
    }

    #[test]
    fn should_advance_in_multiple_steps() {
        let bufs = [vec![0u8; 4096], vec![1u8; 8192], vec![2u8; 100]];
        let mut iovecs: Vec<_> = bufs.iter().map(|b| IoSlice::new(b)).collect();
        let mut window = TransferWindow::new(&mut iovecs);

        // lands 904 bytes into the second buffer
        window.advance(5000);
        assert_eq!(window.len(), 2);
        assert_eq!(window.as_slice()[0].len(), 7288);
        assert_eq!(window.as_slice()[1].len(), 100);
        assert_eq!(window.remaining(), 7388);

        window.advance(7388);
        assert!(window.is_empty());
    }

    #[test]
    fn should_drop_zero_length_leading_entries() {
        let bufs = [vec![], vec![], vec![0, 1, 2]];
        let mut iovecs: Vec<_> = bufs.iter().map(|b| IoSlice::new(b)).collect();
        let mut window = TransferWindow::new(&mut iovecs);

        window.advance(0);

        assert_eq!(window.len(), 1);
        assert_eq!(window.remaining(), 3);
    }

    #[test]
    #[should_panic]
    fn should_panic_advancing_past_end() {
        let bufs = [vec![0, 1, 2], vec![3, 4, 5]];
        let mut iovecs: Vec<_> = bufs.iter().map(|b| IoSlice::new(b)).collect();
        let mut window = TransferWindow::new(&mut iovecs);

        window.advance(7);
    }

    #[test]
    fn should_cap_chunk_at_entry_count() {
        let bufs: Vec<Vec<u8>> = (0..10).map(|i| vec![i]).collect();
        let mut iovecs: Vec<_> = bufs.iter().map(|b| IoSlice::new(b)).collect();
        let mut window = TransferWindow::new(&mut iovecs);

        assert_eq!(window.chunk(4).len(), 4);
        assert_eq!(window.chunk(100).len(), 10);

        // the cap applies to the shifted window after an advance
        window.advance(3);
        assert_eq!(window.chunk(4).len(), 4);
        assert_eq!(flatten(window.chunk(4)), vec![3, 4, 5, 6]);
    }
}
