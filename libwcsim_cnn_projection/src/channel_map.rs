use fxhash::FxHashMap;

use super::error::GeometryError;

/// TubeChannelMap contains the mapping between the simulation tube numbers
/// and the toolchain channel keys, in both directions.
///
/// The map is filled while the geometry is constructed; every digitized hit
/// carries a tube number which must resolve to a channel key before it can be
/// attached to a detector.
#[derive(Debug, Clone, Default)]
pub struct TubeChannelMap {
    tube_to_channel: FxHashMap<i32, u64>,
    channel_to_tube: FxHashMap<u64, i32>,
}

impl TubeChannelMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, tube_no: i32, channel_key: u64) -> Result<(), GeometryError> {
        if self.tube_to_channel.contains_key(&tube_no) {
            return Err(GeometryError::DuplicateTubeId(tube_no));
        }
        if self.channel_to_tube.contains_key(&channel_key) {
            return Err(GeometryError::DuplicateChannelKey(channel_key));
        }
        self.tube_to_channel.insert(tube_no, channel_key);
        self.channel_to_tube.insert(channel_key, tube_no);
        Ok(())
    }

    /// Get the channel key for a given tube number.
    ///
    /// If this returns None the tube does not exist in the map
    pub fn channel_for_tube(&self, tube_no: i32) -> Option<u64> {
        self.tube_to_channel.get(&tube_no).copied()
    }

    pub fn tube_for_channel(&self, channel_key: u64) -> Option<i32> {
        self.channel_to_tube.get(&channel_key).copied()
    }

    pub fn len(&self) -> usize {
        self.tube_to_channel.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tube_to_channel.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let mut map = TubeChannelMap::new();
        map.insert(1, 0).unwrap();
        map.insert(2, 1).unwrap();
        assert_eq!(map.channel_for_tube(1), Some(0));
        assert_eq!(map.channel_for_tube(2), Some(1));
        assert_eq!(map.tube_for_channel(0), Some(1));
        assert_eq!(map.channel_for_tube(3), None);
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn test_duplicates_rejected() {
        let mut map = TubeChannelMap::new();
        map.insert(1, 0).unwrap();
        assert!(matches!(
            map.insert(1, 5),
            Err(GeometryError::DuplicateTubeId(1))
        ));
        assert!(matches!(
            map.insert(7, 0),
            Err(GeometryError::DuplicateChannelKey(0))
        ));
    }
}
