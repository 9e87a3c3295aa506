use super::{GeoCoords, GeoError, Latitude, Longitude, Vec2};

/// 1 degree of latitude is always about the same distance on the ground.
pub const LATITUDE_DEGREE_IN_METRES: f64 = 111_139.0;

pub const DEFAULT_ELEMENT_SIZE: Vec2 = Vec2::new(1000.0, 1000.0);

/// Projection from Earth space into world space (1 unit = 1 metre), and the
/// tile grid laid over it.
///
/// The grid is centered on the world origin and always has odd dimensions, so
/// the origin lies in the middle of exactly one tile. Tiles are numbered row
/// by row, starting from the south-west corner.
#[derive(Debug, Clone, PartialEq)]
pub struct GeoMap {
    /// Earth space coordinates of world space (0, 0).
    geo_origin: GeoCoords,
    /// Size of each grid element, in world space.
    grid_element_size: Vec2,
    /// Most negative corner in grid space, e.g. (-1.5, -1.5) for a 3x3 grid.
    grid_negative_corner: Vec2,
}

impl GeoMap {
    /// Splits the region into a `grid_size` x `grid_size` grid whose tiles
    /// exactly span the bounds on each axis.
    pub fn with_grid_size(
        min_bounds: GeoCoords,
        max_bounds: GeoCoords,
        grid_size: u32,
    ) -> Result<Self, GeoError> {
        if grid_size % 2 == 0 {
            return Err(GeoError::EvenGridDimension(grid_size));
        }
        let extent = region_extent(min_bounds, max_bounds)?;
        let tiles = f64::from(grid_size);

        Ok(GeoMap {
            geo_origin: min_bounds.midpoint(max_bounds),
            grid_element_size: extent / Vec2::new(tiles, tiles),
            grid_negative_corner: Vec2::new(-tiles / 2.0, -tiles / 2.0),
        })
    }

    /// Uses a fixed tile size and picks, per axis, the smallest odd number of
    /// tiles covering the bounds.
    pub fn with_element_size(
        min_bounds: GeoCoords,
        max_bounds: GeoCoords,
        grid_element_size: Vec2,
    ) -> Result<Self, GeoError> {
        if !grid_element_size.is_finite()
            || grid_element_size.x <= 0.0
            || grid_element_size.y <= 0.0
        {
            return Err(GeoError::InvalidElementSize {
                x: grid_element_size.x,
                y: grid_element_size.y,
            });
        }
        let extent = region_extent(min_bounds, max_bounds)?;
        let width = covering_odd_count(extent.x / grid_element_size.x);
        let height = covering_odd_count(extent.y / grid_element_size.y);

        Ok(GeoMap {
            geo_origin: min_bounds.midpoint(max_bounds),
            grid_element_size,
            grid_negative_corner: Vec2::new(-width / 2.0, -height / 2.0),
        })
    }

    pub fn geo_origin(&self) -> GeoCoords {
        self.geo_origin
    }

    pub fn grid_element_size(&self) -> Vec2 {
        self.grid_element_size
    }

    pub fn grid_negative_corner(&self) -> Vec2 {
        self.grid_negative_corner
    }

    /// Number of tiles along x and y.
    pub fn grid_dimensions(&self) -> (u32, u32) {
        let size = self.grid_negative_corner.abs() * 2.0;
        (size.x.round() as u32, size.y.round() as u32)
    }

    pub fn tile_count(&self) -> usize {
        let (width, height) = self.grid_dimensions();
        width as usize * height as usize
    }

    /// Length of one degree of longitude at the given latitude. Shrinks with
    /// cos(latitude) towards the poles.
    pub fn longitude_degree_in_metres(lat: Latitude) -> f64 {
        LATITUDE_DEGREE_IN_METRES * lat.as_radians().cos()
    }

    /// Converts Earth space coordinates into world space. The x scale is
    /// evaluated at the latitude of `coords`, not at the origin's.
    pub fn geo_to_world(&self, coords: GeoCoords) -> Vec2 {
        let offset = coords - self.geo_origin;
        Vec2::new(
            offset.lon.as_degrees() * Self::longitude_degree_in_metres(coords.lat),
            offset.lat.as_degrees() * LATITUDE_DEGREE_IN_METRES,
        )
    }

    /// Inverse of [`GeoMap::geo_to_world`]. The result is not range checked.
    pub fn world_to_geo(&self, world_space: Vec2) -> GeoCoords {
        let lat = self.geo_origin.lat
            + Latitude::unchecked((world_space.y / LATITUDE_DEGREE_IN_METRES).to_radians());
        let lon_degrees = world_space.x / Self::longitude_degree_in_metres(lat);
        let lon = self.geo_origin.lon + Longitude::unchecked(lon_degrees.to_radians());
        GeoCoords::new(lon, lat)
    }

    pub fn world_to_grid(&self, world_space: Vec2) -> Vec2 {
        world_space / self.grid_element_size
    }

    /// Index of the tile containing `world_space`, or `None` when the point
    /// lies outside the grid.
    pub fn grid_index(&self, world_space: Vec2) -> Option<usize> {
        let grid = self.world_to_grid(world_space) - self.grid_negative_corner;
        if !grid.is_finite() {
            return None;
        }
        let (width, height) = self.grid_dimensions();
        let col = grid.x.floor();
        let row = grid.y.floor();
        if col < 0.0 || row < 0.0 || col >= f64::from(width) || row >= f64::from(height) {
            return None;
        }
        Some(row as usize * width as usize + col as usize)
    }
}

/// World space size of the bounds. The width uses the widest parallel inside
/// the bounds so that every in-bounds point falls inside the grid.
fn region_extent(min_bounds: GeoCoords, max_bounds: GeoCoords) -> Result<Vec2, GeoError> {
    let span = max_bounds - min_bounds;
    if !(span.lon.as_radians() > 0.0 && span.lat.as_radians() > 0.0) {
        return Err(GeoError::EmptyBounds {
            min_lon: min_bounds.lon.as_degrees(),
            min_lat: min_bounds.lat.as_degrees(),
            max_lon: max_bounds.lon.as_degrees(),
            max_lat: max_bounds.lat.as_degrees(),
        });
    }
    let widest = widest_parallel(min_bounds.lat, max_bounds.lat);

    Ok(Vec2::new(
        span.lon.as_degrees() * GeoMap::longitude_degree_in_metres(widest),
        span.lat.as_degrees() * LATITUDE_DEGREE_IN_METRES,
    ))
}

fn widest_parallel(south: Latitude, north: Latitude) -> Latitude {
    let (south, north) = (south.as_radians(), north.as_radians());
    if south <= 0.0 && north >= 0.0 {
        Latitude::unchecked(0.0)
    } else {
        Latitude::unchecked(south.abs().min(north.abs()))
    }
}

fn covering_odd_count(tiles: f64) -> f64 {
    let count = tiles.ceil().max(1.0);
    if count % 2.0 == 0.0 {
        count + 1.0
    } else {
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::{fixture, rstest};

    fn coords(lon: f64, lat: f64) -> GeoCoords {
        GeoCoords::from_degrees(lon, lat).expect("valid test coordinates")
    }

    #[fixture]
    fn unit_square() -> GeoMap {
        GeoMap::with_grid_size(coords(-1.0, -1.0), coords(1.0, 1.0), 5)
            .expect("valid grid")
    }

    #[rstest]
    fn origin_is_the_midpoint_of_the_bounds(unit_square: GeoMap) {
        let origin = unit_square.geo_origin();
        assert!(origin.lon.as_degrees().abs() < 1e-12);
        assert!(origin.lat.as_degrees().abs() < 1e-12);
        assert_eq!(unit_square.geo_to_world(origin), Vec2::new(0.0, 0.0));
    }

    #[rstest]
    fn grid_is_five_by_five(unit_square: GeoMap) {
        assert_eq!(unit_square.grid_dimensions(), (5, 5));
        assert_eq!(unit_square.tile_count(), 25);
        assert_eq!(unit_square.grid_negative_corner(), Vec2::new(-2.5, -2.5));
    }

    #[rstest]
    #[case(0.0, 0.0, Some(12))]
    #[case(0.9, 0.9, Some(24))]
    #[case(-0.9, -0.9, Some(0))]
    #[case(0.9, -0.9, Some(4))]
    #[case(-0.9, 0.9, Some(20))]
    #[case(5.0, 5.0, None)]
    #[case(-1.5, 0.0, None)]
    fn maps_points_to_tiles(
        unit_square: GeoMap,
        #[case] lon: f64,
        #[case] lat: f64,
        #[case] expected: Option<usize>,
    ) {
        let world = unit_square.geo_to_world(coords(lon, lat));
        assert_eq!(unit_square.grid_index(world), expected);
    }

    #[rstest]
    fn negative_columns_do_not_wrap_into_the_previous_row(unit_square: GeoMap) {
        let size = unit_square.grid_element_size();
        // One tile west of the grid, on the middle row.
        let world = Vec2::new(-3.0 * size.x, 0.0);
        assert_eq!(unit_square.grid_index(world), None);
    }

    #[rstest]
    #[case(0)]
    #[case(2)]
    #[case(4)]
    fn rejects_even_grid_dimensions(#[case] grid_size: u32) {
        let result = GeoMap::with_grid_size(coords(-1.0, -1.0), coords(1.0, 1.0), grid_size);
        assert_eq!(result, Err(GeoError::EvenGridDimension(grid_size)));
    }

    #[test]
    fn rejects_empty_bounds() {
        let result = GeoMap::with_grid_size(coords(1.0, -1.0), coords(1.0, 1.0), 5);
        assert!(matches!(result, Err(GeoError::EmptyBounds { .. })));
    }

    #[test]
    fn element_size_picks_odd_covering_dimensions() {
        // Roughly 2.2 km wide and 4.4 km tall near the equator.
        let map = GeoMap::with_element_size(
            coords(-0.01, -0.02),
            coords(0.01, 0.02),
            DEFAULT_ELEMENT_SIZE,
        )
        .expect("valid grid");
        assert_eq!(map.grid_dimensions(), (3, 5));
        assert_eq!(map.grid_element_size(), DEFAULT_ELEMENT_SIZE);
    }

    #[test]
    fn rejects_non_positive_element_size() {
        let result =
            GeoMap::with_element_size(coords(-1.0, -1.0), coords(1.0, 1.0), Vec2::new(0.0, 10.0));
        assert!(matches!(result, Err(GeoError::InvalidElementSize { .. })));
    }

    #[test]
    fn longitude_scale_uses_the_point_latitude() {
        let map = GeoMap::with_grid_size(coords(9.0, 40.0), coords(11.0, 60.0), 5)
            .expect("valid grid");
        let south = map.geo_to_world(coords(10.5, 41.0));
        let north = map.geo_to_world(coords(10.5, 59.0));
        let expected_south = 0.5 * LATITUDE_DEGREE_IN_METRES * 41f64.to_radians().cos();
        let expected_north = 0.5 * LATITUDE_DEGREE_IN_METRES * 59f64.to_radians().cos();
        assert!((south.x - expected_south).abs() < 1e-6);
        assert!((north.x - expected_north).abs() < 1e-6);
        assert!(south.x > north.x);
    }

    #[test]
    fn longitude_scale_is_maximal_at_the_equator() {
        let equator = GeoMap::longitude_degree_in_metres(Latitude::unchecked(0.0));
        assert_eq!(equator, LATITUDE_DEGREE_IN_METRES);
        let pole =
            GeoMap::longitude_degree_in_metres(Latitude::unchecked(std::f64::consts::FRAC_PI_2));
        assert!(pole.abs() < 1e-9);
    }

    #[test]
    fn corners_of_high_latitude_bounds_stay_on_the_grid() {
        let map = GeoMap::with_grid_size(coords(-0.5, 50.0), coords(0.5, 52.0), 5)
            .expect("valid grid");
        let corners = [
            (-0.4999, 50.0001),
            (0.4999, 50.0001),
            (-0.4999, 51.9999),
            (0.4999, 51.9999),
        ];
        for (lon, lat) in corners {
            let world = map.geo_to_world(coords(lon, lat));
            assert!(
                map.grid_index(world).is_some(),
                "({lon}, {lat}) fell off the grid"
            );
        }
    }

    proptest! {
        #[test]
        fn projection_round_trips(lon in -0.999f64..0.999, lat in 49.001f64..52.999) {
            let map = GeoMap::with_grid_size(coords(-1.0, 49.0), coords(1.0, 53.0), 5)
                .expect("valid grid");
            let point = coords(lon, lat);
            let back = map.world_to_geo(map.geo_to_world(point));
            prop_assert!((back.lon.as_degrees() - lon).abs() < 1e-9);
            prop_assert!((back.lat.as_degrees() - lat).abs() < 1e-9);
        }

        #[test]
        fn points_inside_bounds_land_in_exactly_the_containing_tile(
            lon in -0.9999f64..0.9999,
            lat in -0.9999f64..0.9999,
        ) {
            let map = GeoMap::with_grid_size(coords(-1.0, -1.0), coords(1.0, 1.0), 5)
                .expect("valid grid");
            let world = map.geo_to_world(coords(lon, lat));
            let index = map.grid_index(world);
            prop_assert!(index.is_some());
            let index = index.unwrap_or_default();
            prop_assert!(index < map.tile_count());
            prop_assert_eq!(map.grid_index(world), Some(index));

            let grid = map.world_to_grid(world) - map.grid_negative_corner();
            let (width, _) = map.grid_dimensions();
            let col = (index % width as usize) as f64;
            let row = (index / width as usize) as f64;
            prop_assert!(col <= grid.x && grid.x < col + 1.0);
            prop_assert!(row <= grid.y && grid.y < row + 1.0);
        }

        #[test]
        fn longitude_scale_shrinks_away_from_the_equator(
            a in 0.0f64..89.9,
            delta in 0.01f64..0.1,
        ) {
            let scale = |degrees: f64| {
                let lat = Latitude::degrees(degrees).expect("valid latitude");
                GeoMap::longitude_degree_in_metres(lat)
            };
            prop_assert!(scale(a + delta) < scale(a));
            prop_assert!(scale(-(a + delta)) < scale(a));
        }
    }
}
