// End-to-end tests for the FeedHive Backend API
//
// One shared PostgreSQL container backs the whole suite. Each test leases its
// own migrated database from a pool and gets a wiremock server standing in
// for the feed publishers, so tests run in parallel without sharing state.

mod test_retention;
